//! Demonstrates configuring an account through the relay and publishing an OAuth 1.0a signed
//! tweet against a mock X API.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use social_relay::{
	config::Endpoints,
	handlers::{AccountUpdate, NewAccount, Relay, XPostRequest},
	http::ReqwestHttpClient,
	reqwest::Client,
	store::{AccountStore, MemoryStore, PostStore, SecretStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let store = Arc::new(MemoryStore::default());
	let accounts: Arc<dyn AccountStore> = store.clone();
	let posts: Arc<dyn PostStore> = store.clone();
	let secrets: Arc<dyn SecretStore> = store;
	let server = MockServer::start_async().await;
	let tweet_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/2/tweets").header_exists("authorization");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"data\":{\"id\":\"1790000000000000000\"}}");
		})
		.await;
	let endpoints =
		Endpoints::builder().twitter_tweets(Url::parse(&server.url("/2/tweets"))?).build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let relay = Relay::new(accounts, posts, secrets, endpoints).with_http_client(http_client);
	let created =
		relay.add_account(NewAccount { id: "Acme".into(), name: "Acme Corp".into() }).await;

	println!("Created account: {} {}.", created.status, created.body);

	let update: AccountUpdate = serde_json::from_value(json!({
		"twitter": {
			"handle": "acme_hq",
			"apiKey": "demo-key",
			"apiKeySecret": "demo-secret",
			"accessToken": "demo-token",
			"accessTokenSecret": "demo-token-secret",
		}
	}))?;

	relay.update_account("acme", update).await;

	let request: XPostRequest =
		serde_json::from_value(json!({ "accountId": "acme", "message": "Hello from the relay" }))?;
	let tweet = relay.send_x_post(request).await?;

	println!("Published tweet: https://x.com/acme_hq/status/{}.", tweet.id);

	tweet_mock.assert_async().await;

	Ok(())
}

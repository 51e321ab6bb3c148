// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use social_relay::{
	_preludet::*,
	account::{Platform, PlatformStatus},
	auth::{AccountId, LinkedInKeys, Secret},
	handlers::{
		AccountUpdate, AuthenticateLinkedIn, ExpireLinkedIn, LinkedInCallback,
		LinkedInPostRequest, NewAccount, Relay, TestPost,
	},
	scheduler::TOKEN_EXPIRATION_GROUP,
	store::{AccountStore, SecretKey, SecretStore},
};

const ORIGIN: &str = "https://relay.example.com";
const STATE: &str = "https://relay.example.com/v1/linkedin/redirect|acme";

fn account_id() -> AccountId {
	AccountId::new("acme").expect("Account fixture should be valid.")
}

async fn relay_with_account(server: &MockServer, organization: bool) -> (Relay, TestBackends) {
	let (relay, backends) = build_test_relay(mock_endpoints(|path| server.url(path)));

	relay.add_account(NewAccount { id: "acme".into(), name: "Acme".into() }).await;

	if organization {
		let update: AccountUpdate =
			serde_json::from_value(json!({ "linkedIn": { "organizationId": "42" } }))
				.expect("Update fixture should deserialize.");

		assert_eq!(relay.update_account("acme", update).await.status, 204);
	}

	for (name, value) in
		[(SecretKey::LINKEDIN_CLIENT_ID, "client-1"), (SecretKey::LINKEDIN_CLIENT_SECRET, "shh")]
	{
		backends
			.store
			.put_secret(SecretKey::shared(name), Secret::new(value))
			.await
			.expect("Shared secret fixture should be stored.");
	}

	(relay, backends)
}

async fn store_token(backends: &TestBackends) {
	backends
		.store
		.put_secret(
			SecretKey::account(&account_id(), Platform::LinkedIn),
			LinkedInKeys { access_token: "li-token".into() }.to_secret(),
		)
		.await
		.expect("LinkedIn token fixture should be stored.");
}

#[tokio::test]
async fn authenticate_returns_authorization_url() {
	let server = MockServer::start_async().await;
	let (relay, _backends) = relay_with_account(&server, true).await;
	let response = relay
		.authenticate_linkedin(AuthenticateLinkedIn { account_id: "Acme".into() }, ORIGIN)
		.await;

	assert_eq!(response.status, 200);

	let url = response.json_body()["url"]
		.as_str()
		.map(Url::parse)
		.expect("Response should carry a URL.")
		.expect("Authorization URL should parse.");
	let query = url.query_pairs().into_owned().collect::<HashMap<_, _>>();

	assert_eq!(url.path(), "/oauth/v2/authorization");
	assert_eq!(query.get("client_id").map(String::as_str), Some("client-1"));
	assert_eq!(query.get("scope").map(String::as_str), Some("w_member_social"));
	assert_eq!(query.get("state").map(String::as_str), Some(STATE));
	assert_eq!(
		query.get("redirect_uri").map(String::as_str),
		Some("https://relay.example.com/v1/linkedin/redirect")
	);
}

#[tokio::test]
async fn authenticate_requires_organization_and_account() {
	let server = MockServer::start_async().await;
	let (relay, _backends) = relay_with_account(&server, false).await;
	let unconfigured = relay
		.authenticate_linkedin(AuthenticateLinkedIn { account_id: "acme".into() }, ORIGIN)
		.await;

	assert_eq!(unconfigured.status, 409);
	assert_eq!(unconfigured.json_body()["message"], "Account not setup for LinkedIn");

	let missing = relay
		.authenticate_linkedin(AuthenticateLinkedIn { account_id: "ghost".into() }, ORIGIN)
		.await;

	assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn capture_stores_token_and_schedules_expiry() {
	let server = MockServer::start_async().await;
	let (relay, backends) = relay_with_account(&server, true).await;
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/v2/accessToken")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=auth-code");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"li-token\",\"expires_in\":5184000}");
		})
		.await;
	let before = OffsetDateTime::now_utc();
	let response = relay
		.capture_linkedin_token(LinkedInCallback { code: "auth-code".into(), state: STATE.into() })
		.await;

	exchange.assert_async().await;

	assert_eq!(response.status, 302);
	assert_eq!(response.header("location"), Some("https://relay.example.com/v1/accounts/acme"));
	assert_eq!(response.header("access-control-allow-origin"), Some("*"));

	let secret = backends
		.store
		.get_secret(&SecretKey::account(&account_id(), Platform::LinkedIn))
		.await
		.expect("Secret fetch should succeed.")
		.expect("LinkedIn token should be stored.");

	assert_eq!(
		LinkedInKeys::from_secret(&secret).expect("Stored token should decode.").access_token,
		Secret::new("li-token")
	);

	let account = backends
		.store
		.fetch(&account_id())
		.await
		.expect("Account fetch should succeed.")
		.expect("Account should remain present.");

	assert!(account.linked_in.is_active());
	assert!(account.linked_in.status_timestamp.is_some_and(|at| at >= before));

	let timers = backends.scheduler.schedules_in(TOKEN_EXPIRATION_GROUP);

	assert_eq!(timers.len(), 1);
	assert_eq!(timers[0].name, "acme-LI-TOKEN");
	assert_eq!(timers[0].payload, json!({ "accountId": "acme" }));

	let expected = before + Duration::days(59);

	assert!((timers[0].fire_at - expected).abs() < Duration::minutes(1));
}

#[tokio::test]
async fn capture_rejects_out_of_range_token_lifetime() {
	let server = MockServer::start_async().await;
	let (relay, backends) = relay_with_account(&server, true).await;
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/v2/accessToken");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"li-token\",\"expires_in\":9223372036854775807}");
		})
		.await;
	let response = relay
		.capture_linkedin_token(LinkedInCallback { code: "auth-code".into(), state: STATE.into() })
		.await;

	exchange.assert_async().await;

	assert_eq!(response.status, 500);
	assert!(backends.scheduler.schedules_in(TOKEN_EXPIRATION_GROUP).is_empty());
	assert!(
		backends
			.store
			.get_secret(&SecretKey::account(&account_id(), Platform::LinkedIn))
			.await
			.expect("Secret fetch should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn expiry_marks_credentials_expired() {
	let server = MockServer::start_async().await;
	let (relay, backends) = relay_with_account(&server, true).await;

	store_token(&backends).await;
	relay
		.expire_linkedin_credentials(ExpireLinkedIn { account_id: account_id() })
		.await
		.expect("Expiry should succeed.");

	let account = backends
		.store
		.fetch(&account_id())
		.await
		.expect("Account fetch should succeed.")
		.expect("Account should remain present.");

	assert_eq!(account.linked_in.status, Some(PlatformStatus::Expired));
	assert!(
		backends
			.store
			.get_secret(&SecretKey::account(&account_id(), Platform::LinkedIn))
			.await
			.expect("Secret fetch should succeed.")
			.is_none()
	);

	let ghost = AccountId::new("ghost").expect("Account fixture should be valid.");
	let err = relay
		.expire_linkedin_credentials(ExpireLinkedIn { account_id: ghost })
		.await
		.expect_err("Unknown accounts should fail.");

	assert!(matches!(err, Error::AccountNotFound { .. }));
}

#[tokio::test]
async fn posts_are_authored_by_the_organization() {
	let server = MockServer::start_async().await;
	let (relay, backends) = relay_with_account(&server, true).await;

	store_token(&backends).await;

	let posts = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/rest/posts")
				.header("authorization", "Bearer li-token")
				.header("linkedin-version", "202405")
				.header("x-restli-protocol-version", "2.0.0")
				.body_includes("urn:li:organization:42");
			then.status(201).header("x-restli-id", "urn:li:share:7001");
		})
		.await;
	let request = LinkedInPostRequest { account_id: account_id(), message: "Hello".into() };
	let result = relay.send_linkedin_post(request).await.expect("LinkedIn post should succeed.");

	assert_eq!(result.url, "urn:li:share:7001");

	posts.assert_async().await;
}

#[tokio::test]
async fn test_post_links_to_the_share() {
	let server = MockServer::start_async().await;
	let (relay, backends) = relay_with_account(&server, true).await;
	let mut account = backends
		.store
		.fetch(&account_id())
		.await
		.expect("Account fetch should succeed.")
		.expect("Account should remain present.");

	account.linked_in.status = Some(PlatformStatus::Active);

	backends.store.save(account).await.expect("Account update should succeed.");
	store_token(&backends).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/rest/posts");
			then.status(201).header("x-restli-id", "urn:li:share:7002");
		})
		.await;

	let response = relay
		.send_test_post("acme", TestPost { platform: "linkedIn".into(), message: "Hi".into() })
		.await;

	assert_eq!(response.status, 201);
	assert_eq!(response.json_body()["url"], "https://linkedin.com/posts/urn:li:share:7002");
}

#[tokio::test]
async fn missing_token_is_a_configuration_error() {
	let server = MockServer::start_async().await;
	let (relay, _backends) = relay_with_account(&server, true).await;
	let request = LinkedInPostRequest { account_id: account_id(), message: "Hello".into() };
	let err = relay.send_linkedin_post(request).await.expect_err("Missing token should fail.");

	assert!(matches!(err, Error::Config(_)));
}

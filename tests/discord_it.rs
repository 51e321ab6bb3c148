// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use social_relay::{
	_preludet::*,
	handlers::{
		AccountUpdate, DiscordMessageRequest, DiscordMessageResult, NewAccount, Relay, TestPost,
	},
	store::{SecretKey, SecretStore},
};

async fn relay_with_channel(server: &MockServer, channel: Option<&str>) -> Relay {
	let (relay, backends) = build_test_relay(mock_endpoints(|path| server.url(path)));

	relay.add_account(NewAccount { id: "acme".into(), name: "Acme".into() }).await;

	let update: AccountUpdate = serde_json::from_value(json!({ "discord": { "channel": channel } }))
		.expect("Update fixture should deserialize.");

	assert_eq!(relay.update_account("acme", update).await.status, 204);

	backends
		.store
		.put_secret(SecretKey::shared(SecretKey::DISCORD_BOT_TOKEN), "bot-token".into())
		.await
		.expect("Bot token fixture should be stored.");

	relay
}

fn message(body: serde_json::Value) -> DiscordMessageRequest {
	serde_json::from_value(body).expect("Message request fixture should deserialize.")
}

#[tokio::test]
async fn messages_go_to_the_account_channel() {
	let server = MockServer::start_async().await;
	let relay = relay_with_channel(&server, Some("123")).await;
	let send = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v10/channels/123/messages")
				.header("authorization", "Bot bot-token")
				.body_includes("\"content\":\"Release notes\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"m-9\",\"channel_id\":\"123\"}");
		})
		.await;
	let result = relay
		.send_discord_message(message(json!({ "accountId": "acme", "message": "Release notes" })))
		.await
		.expect("Discord message should be delivered.");

	assert_eq!(result, DiscordMessageResult::Sent { id: "m-9".into() });
	assert_eq!(
		serde_json::to_value(&result).expect("Result should serialize."),
		json!({ "id": "m-9" })
	);

	send.assert_async().await;
}

#[tokio::test]
async fn missing_channel_reports_failure() {
	let server = MockServer::start_async().await;
	let relay = relay_with_channel(&server, Some("123")).await;
	let send = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v10/channels/999/messages");
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"message\":\"Unknown Channel\",\"code\":10003}");
		})
		.await;
	let result = relay
		.send_discord_message(message(json!({
			"accountId": "acme",
			"message": "Hello",
			"metadata": { "channel": "999" },
		})))
		.await
		.expect("Missing channels should not be an error.");

	assert_eq!(
		serde_json::to_value(&result).expect("Result should serialize."),
		json!({ "success": false })
	);

	send.assert_async().await;
}

#[tokio::test]
async fn test_post_reports_delivery() {
	let server = MockServer::start_async().await;
	let relay = relay_with_channel(&server, Some("123")).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v10/channels/123/messages");
			then.status(200).header("content-type", "application/json").body("{\"id\":\"m-1\"}");
		})
		.await;

	let response = relay
		.send_test_post("acme", TestPost { platform: "discord".into(), message: "Hi".into() })
		.await;

	assert_eq!(response.status, 201);
	assert_eq!(response.json_body()["message"], "Message sent to channel: m-1");
}

#[tokio::test]
async fn unconfigured_discord_is_reported() {
	let server = MockServer::start_async().await;
	let relay = relay_with_channel(&server, None).await;
	let response = relay
		.send_test_post("acme", TestPost { platform: "discord".into(), message: "Hi".into() })
		.await;

	assert_eq!(response.status, 201);
	assert_eq!(
		response.json_body()["message"],
		"Discord is not configured properly for this account"
	);

	let err = relay
		.send_discord_message(message(json!({ "accountId": "acme", "message": "Hi" })))
		.await
		.expect_err("Sending without a channel should fail.");

	assert!(matches!(err, Error::PlatformNotConfigured { .. }));
}

#[tokio::test]
async fn channels_must_be_snowflakes() {
	let server = MockServer::start_async().await;
	let relay = relay_with_channel(&server, Some("123")).await;
	let send = server
		.mock_async(|when, then| {
			when.method(POST);
			then.status(200).header("content-type", "application/json").body("{\"id\":\"m-1\"}");
		})
		.await;
	let err = relay
		.send_discord_message(message(json!({
			"accountId": "acme",
			"message": "Hello",
			"metadata": { "channel": "../users/@me" },
		})))
		.await
		.expect_err("Non-numeric channels should be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let update: AccountUpdate =
		serde_json::from_value(json!({ "discord": { "channel": "123/../../guilds" } }))
			.expect("Update fixture should deserialize.");

	assert_eq!(relay.update_account("acme", update).await.status, 400);

	send.assert_calls_async(0).await;
}

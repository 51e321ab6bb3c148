//! Discord REST client for bot messages.

// crates.io
use reqwest::{
	StatusCode,
	header::AUTHORIZATION,
	multipart::{Form, Part},
};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	http::{self, ReqwestHttpClient},
	platforms::MediaKind,
};

const MESSAGES: &str = "discord.messages";

/// Result of a delivery attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
	/// Message accepted under the given id.
	Sent {
		/// Message snowflake.
		id: String,
	},
	/// The channel does not exist or the bot cannot see it.
	ChannelMissing,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
	id: String,
}

/// Whether `value` has the shape of a Discord snowflake id (ASCII digits only).
pub fn is_snowflake(value: &str) -> bool {
	!value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

/// Posts `text` to a channel, optionally attaching an MP4 as `clip.mp4`.
///
/// Channels that are not snowflakes are rejected before any request is built.
pub async fn send_message(
	http: &ReqwestHttpClient,
	api_base: &Url,
	bot_token: &Secret,
	channel: &str,
	text: &str,
	attachment: Option<Vec<u8>>,
) -> Result<Delivery> {
	if !is_snowflake(channel) {
		return Err(Error::invalid_request(format!(
			"Discord channel `{channel}` is not a valid id"
		)));
	}

	let endpoint = api_base
		.join(&format!("channels/{channel}/messages"))
		.map_err(|source| ConfigError::InvalidEndpoint { endpoint: MESSAGES, source })?;
	let request = http.post(endpoint).header(AUTHORIZATION, format!("Bot {}", bot_token.expose()));
	let request = match attachment {
		Some(bytes) => {
			let kind = MediaKind::Video;
			let payload = json!({
				"content": text,
				"attachments": [{ "id": 0, "filename": kind.file_name() }],
			});
			let file = Part::bytes(bytes).file_name(kind.file_name()).mime_str(kind.mime_type())?;
			let form = Form::new().text("payload_json", payload.to_string()).part("files[0]", file);

			request.multipart(form)
		},
		None => request.json(&json!({ "content": text })),
	};
	let response = request.send().await?;

	if response.status() == StatusCode::NOT_FOUND {
		tracing::warn!(channel, "Discord channel not found.");

		return Ok(Delivery::ChannelMissing);
	}

	let response = http::ensure_success(MESSAGES, response)?;
	let message: MessageResponse = http::decode_json(MESSAGES, response).await?;

	Ok(Delivery::Sent { id: message.id })
}

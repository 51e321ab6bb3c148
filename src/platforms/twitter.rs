//! X (Twitter) API client: tweets, media uploads, and the app-only bearer exchange.

// crates.io
use reqwest::multipart::{Form, Part};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{ConsumerKeys, Secret, TwitterAuth},
	error::TransientError,
	ext::{RequestSignerExt, TwitterRequestSigner},
	http::{self, ReqwestHttpClient},
	platforms::MediaKind,
};

/// Size of each APPEND segment in chunked video uploads.
pub const VIDEO_CHUNK_SIZE: usize = 4 * 1024 * 1024;
/// Upper bound on `command=STATUS` checks while X processes an uploaded video.
pub const MAX_STATUS_CHECKS: u32 = 60;

const DEFAULT_CHECK_AFTER_SECS: u64 = 1;

const TWEETS: &str = "twitter.tweets";
const MEDIA_UPLOAD: &str = "twitter.media_upload";
const TOKEN: &str = "twitter.token";

#[derive(Debug, Deserialize)]
struct TweetEnvelope {
	data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
	id: String,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
	media_id_string: String,
	#[serde(default)]
	processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
	state: ProcessingState,
	#[serde(default)]
	check_after_secs: Option<u64>,
	#[serde(default)]
	error: Option<ProcessingError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ProcessingState {
	Pending,
	InProgress,
	Succeeded,
	Failed,
}

#[derive(Debug, Deserialize)]
struct ProcessingError {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BearerResponse {
	access_token: String,
}

/// Publishes a tweet and returns its id.
///
/// The body is `{"text": ...}`, extended with `{"media": {"media_ids": [...]}}` when media is
/// attached.
pub async fn post_tweet(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	auth: &TwitterAuth,
	text: &str,
	media_ids: &[String],
) -> Result<String> {
	let mut body = json!({ "text": text });

	if !media_ids.is_empty() {
		body["media"] = json!({ "media_ids": media_ids });
	}

	let request = TwitterRequestSigner.attach_auth(
		http.post(endpoint.clone()).json(&body),
		auth,
		"POST",
		endpoint,
	)?;
	let response = http::send(TWEETS, request).await?;
	let envelope: TweetEnvelope = http::decode_json(TWEETS, response).await?;

	Ok(envelope.data.id)
}

/// Uploads media and returns its `media_id_string`.
///
/// Images go up in one multipart request; videos use the chunked INIT/APPEND/FINALIZE sequence
/// and, while X reports `processing_info`, poll `command=STATUS` until processing settles.
/// Every upload request is multipart, so no body parameter enters the OAuth signature.
pub async fn upload_media(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	auth: &TwitterAuth,
	bytes: Vec<u8>,
	kind: MediaKind,
) -> Result<String> {
	match kind {
		MediaKind::Image => {
			let form = Form::new()
				.text("media_category", "tweet_image")
				.part("media", media_part(bytes, kind)?);

			upload_step(http, endpoint, auth, form)
				.await?
				.map(|media| media.media_id_string)
				.ok_or_else(|| missing_media_id("upload"))
		},
		MediaKind::Video => upload_video(http, endpoint, auth, bytes).await,
	}
}

/// Exchanges the consumer pair for an app-only bearer token.
///
/// Any non-success status is returned as a transport error; the caller caches only successes.
pub async fn exchange_bearer_token(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	consumer: &ConsumerKeys,
) -> Result<Secret> {
	let request = http
		.post(endpoint.clone())
		.basic_auth(consumer.key.expose(), Some(consumer.secret.expose()))
		.form(&[("grant_type", "client_credentials")]);
	let response = http::send(TOKEN, request).await?;
	let token: BearerResponse = http::decode_json(TOKEN, response).await?;

	Ok(Secret::new(token.access_token))
}

async fn upload_video(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	auth: &TwitterAuth,
	bytes: Vec<u8>,
) -> Result<String> {
	let kind = MediaKind::Video;
	let init = Form::new()
		.text("command", "INIT")
		.text("total_bytes", bytes.len().to_string())
		.text("media_type", kind.mime_type())
		.text("media_category", "tweet_video");
	let media_id = upload_step(http, endpoint, auth, init)
		.await?
		.map(|media| media.media_id_string)
		.ok_or_else(|| missing_media_id("INIT"))?;

	for (index, chunk) in bytes.chunks(VIDEO_CHUNK_SIZE).enumerate() {
		let append = Form::new()
			.text("command", "APPEND")
			.text("media_id", media_id.clone())
			.text("segment_index", index.to_string())
			.part("media", media_part(chunk.to_vec(), kind)?);

		upload_step(http, endpoint, auth, append).await?;
	}

	let finalize = Form::new().text("command", "FINALIZE").text("media_id", media_id.clone());
	let Some(finalized) = upload_step(http, endpoint, auth, finalize).await? else {
		return Ok(media_id);
	};
	let media_id = finalized.media_id_string;
	let mut processing = finalized.processing_info;
	let mut checks = 0;

	while let Some(info) = processing {
		match info.state {
			ProcessingState::Succeeded => break,
			ProcessingState::Failed => return Err(processing_failed(&media_id, info.error)),
			ProcessingState::Pending | ProcessingState::InProgress => {},
		}

		if checks == MAX_STATUS_CHECKS {
			return Err(TransientError::UnexpectedResponse {
				endpoint: MEDIA_UPLOAD,
				message: format!(
					"media {media_id} still processing after {MAX_STATUS_CHECKS} status checks"
				),
			}
			.into());
		}

		checks += 1;

		let wait = info.check_after_secs.unwrap_or(DEFAULT_CHECK_AFTER_SECS);

		tracing::debug!(%media_id, state = ?info.state, wait, "Video still processing.");
		tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

		processing = media_status(http, endpoint, auth, &media_id).await?.processing_info;
	}

	Ok(media_id)
}

/// Reads the processing state of an uploaded video with a signed `command=STATUS` GET.
async fn media_status(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	auth: &TwitterAuth,
	media_id: &str,
) -> Result<MediaResponse> {
	let mut url = endpoint.clone();

	url.query_pairs_mut().append_pair("command", "STATUS").append_pair("media_id", media_id);

	let request = TwitterRequestSigner.attach_auth(http.get(url.clone()), auth, "GET", &url)?;
	let response = http::send(MEDIA_UPLOAD, request).await?;

	http::decode_json(MEDIA_UPLOAD, response).await
}

/// Sends one upload request; returns the parsed body when the response carries one.
async fn upload_step(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	auth: &TwitterAuth,
	form: Form,
) -> Result<Option<MediaResponse>> {
	let request = TwitterRequestSigner.attach_auth(
		http.post(endpoint.clone()).multipart(form),
		auth,
		"POST",
		endpoint,
	)?;
	let response = http::send(MEDIA_UPLOAD, request).await?;
	let status = response.status().as_u16();
	let body = response.bytes().await?;

	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(None);
	}

	http::parse_json(MEDIA_UPLOAD, &body, Some(status)).map(Some)
}

fn media_part(bytes: Vec<u8>, kind: MediaKind) -> Result<Part> {
	Ok(Part::bytes(bytes).file_name(kind.file_name()).mime_str(kind.mime_type())?)
}

fn processing_failed(media_id: &str, error: Option<ProcessingError>) -> Error {
	let reason = error
		.and_then(|error| error.message.or(error.name))
		.unwrap_or_else(|| "no reason given".into());

	TransientError::UnexpectedResponse {
		endpoint: MEDIA_UPLOAD,
		message: format!("media {media_id} processing failed: {reason}"),
	}
	.into()
}

fn missing_media_id(step: &str) -> Error {
	TransientError::UnexpectedResponse {
		endpoint: MEDIA_UPLOAD,
		message: format!("{step} response did not include a media id"),
	}
	.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tweet_envelope_reads_nested_id() {
		let envelope: TweetEnvelope = serde_json::from_str(
			r#"{"data":{"id":"1790","text":"hi","edit_history_tweet_ids":["1790"]}}"#,
		)
		.expect("Tweet envelope should parse.");

		assert_eq!(envelope.data.id, "1790");
	}

	#[test]
	fn processing_info_reads_state_and_wait() {
		let media: MediaResponse = serde_json::from_value(json!({
			"media_id": 710,
			"media_id_string": "710",
			"processing_info": {
				"state": "in_progress",
				"check_after_secs": 5,
				"progress_percent": 8,
			},
		}))
		.expect("Media response should parse.");
		let info = media.processing_info.expect("Processing info should be present.");

		assert_eq!(info.state, ProcessingState::InProgress);
		assert_eq!(info.check_after_secs, Some(5));

		let failed = processing_failed(
			"710",
			Some(ProcessingError { name: Some("InvalidMedia".into()), message: None }),
		);

		assert!(failed.to_string().contains("InvalidMedia"));
	}

	#[test]
	fn media_parts_build_for_known_kinds() {
		media_part(vec![1, 2, 3], MediaKind::Image).expect("PNG part should build.");
		media_part(vec![1, 2, 3], MediaKind::Video).expect("MP4 part should build.");
	}
}

//! Transport primitives shared by every upstream client.
//!
//! [`ReqwestHttpClient`] wraps the reqwest client handed to platform modules.
//! [`ResponseMetadata`] captures the status and `Retry-After` hint of a response so non-success
//! statuses surface as [`TransportError::Status`] with consistent fields.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	RequestBuilder, Response,
	header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{TransientError, TransportError},
};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}

/// Metadata captured from an upstream response before its body is consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Captures metadata from a response.
	pub fn from_response(response: &Response) -> Self {
		Self {
			status: response.status().as_u16(),
			retry_after: parse_retry_after(response.headers()),
		}
	}

	/// Converts the metadata into a status error for `endpoint`.
	pub fn into_error(self, endpoint: &'static str) -> TransportError {
		TransportError::Status { endpoint, status: self.status, retry_after: self.retry_after }
	}
}

/// Sends a request and rejects non-success statuses.
pub(crate) async fn send(endpoint: &'static str, request: RequestBuilder) -> Result<Response> {
	ensure_success(endpoint, request.send().await?)
}

/// Rejects non-success statuses, logging the rejection.
pub(crate) fn ensure_success(endpoint: &'static str, response: Response) -> Result<Response> {
	if response.status().is_success() {
		Ok(response)
	} else {
		let meta = ResponseMetadata::from_response(&response);

		tracing::debug!(endpoint, status = meta.status, "Upstream rejected request.");

		Err(meta.into_error(endpoint).into())
	}
}

/// Reads a successful response body as JSON with path-aware error reporting.
pub(crate) async fn decode_json<T>(endpoint: &'static str, response: Response) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status().as_u16();
	let body = response.bytes().await?;

	parse_json(endpoint, &body, Some(status))
}

/// Parses a JSON payload with path-aware error reporting.
pub(crate) fn parse_json<T>(endpoint: &'static str, body: &[u8], status: Option<u16>) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransientError::ResponseParse { endpoint, source, status }.into())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

//! HTTP-facing response envelope and error mapping.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	obs::{self, OperationKind},
};

/// Generic failure message returned for unexpected errors.
pub const GENERIC_FAILURE: &str = "Something went wrong";
/// Message returned when the addressed account does not exist.
pub const ACCOUNT_NOT_FOUND: &str = "Account not found";

/// Response handed back to the hosting HTTP runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers in insertion order.
	pub headers: Vec<(String, String)>,
	/// Response body; empty for `204` and redirects.
	pub body: String,
}
impl ApiResponse {
	/// JSON response.
	pub fn json(status: u16, body: &Value) -> Self {
		Self {
			status,
			headers: vec![("Content-Type".into(), "application/json".into())],
			body: body.to_string(),
		}
	}

	/// JSON response of the form `{"message": ...}`.
	pub fn message(status: u16, message: impl Into<String>) -> Self {
		Self::json(status, &json!({ "message": message.into() }))
	}

	/// `200` HTML page.
	pub fn html(body: String) -> Self {
		Self { status: 200, headers: vec![("Content-Type".into(), "text/html".into())], body }
	}

	/// `302` redirect that any origin may follow.
	pub fn redirect(location: impl Into<String>) -> Self {
		Self {
			status: 302,
			headers: vec![
				("Location".into(), location.into()),
				("Access-Control-Allow-Origin".into(), "*".into()),
			],
			body: String::new(),
		}
	}

	/// `404` naming the missing account.
	pub fn not_found() -> Self {
		Self::message(404, ACCOUNT_NOT_FOUND)
	}

	/// `204` with no body.
	pub fn no_content() -> Self {
		Self { status: 204, headers: Vec::new(), body: String::new() }
	}

	/// Returns the first header value matching `name`, ignoring case.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Parses the body as JSON, returning `Value::Null` for empty or non-JSON bodies.
	pub fn json_body(&self) -> Value {
		serde_json::from_str(&self.body).unwrap_or(Value::Null)
	}
}
impl From<&Error> for ApiResponse {
	fn from(e: &Error) -> Self {
		match e {
			Error::AccountNotFound { .. } => Self::not_found(),
			Error::AccountExists { .. } => Self::message(409, "Account already exists"),
			Error::PlatformNotConfigured { platform, .. } =>
				Self::message(409, format!("Account not setup for {}", platform.label())),
			Error::InvalidRequest { reason } => Self::message(400, reason.clone()),
			_ => Self::message(500, GENERIC_FAILURE),
		}
	}
}

/// Runs an HTTP-facing operation under observation and folds failures into a response.
pub(crate) async fn respond<Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> ApiResponse
where
	Fut: Future<Output = Result<ApiResponse>>,
{
	match obs::observe(kind, stage, fut).await {
		Ok(response) => response,
		Err(e) => ApiResponse::from(&e),
	}
}

//! Relay-level error types shared across handlers, platforms, and stores.

// self
use crate::{_prelude::*, account::Platform, auth::AccountId};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Scheduler-layer failure.
	#[error("{0}")]
	Scheduler(
		#[from]
		#[source]
		crate::scheduler::SchedulerError,
	),
	/// Local configuration problem (missing credentials, invalid endpoints).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream returned something the relay could not use.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure or non-success HTTP status.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No account exists under the requested identifier.
	#[error("Account `{account}` was not found.")]
	AccountNotFound {
		/// Normalized account identifier.
		account: AccountId,
	},
	/// An account already exists under the requested identifier.
	#[error("Account `{account}` already exists.")]
	AccountExists {
		/// Normalized account identifier.
		account: AccountId,
	},
	/// The account has not been configured for the requested platform.
	#[error("Account `{account}` is not configured for {platform}.")]
	PlatformNotConfigured {
		/// Normalized account identifier.
		account: AccountId,
		/// Platform that lacks configuration.
		platform: Platform,
	},
	/// Caller supplied a malformed request.
	#[error("Invalid request: {reason}.")]
	InvalidRequest {
		/// Human-readable reason.
		reason: String,
	},
}
impl Error {
	/// Returns the upstream HTTP status when the error carries one.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Transport(TransportError::Status { status, .. }) => Some(*status),
			Self::Transient(TransientError::ResponseParse { status, .. }) => *status,
			_ => None,
		}
	}

	/// Returns `true` when the upstream rejected the request's credentials.
	pub fn is_unauthorized(&self) -> bool {
		self.http_status() == Some(401)
	}

	pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Stored credentials lack required fields.
	#[error("Required secrets not found for {platform} on `{account}`: [{fields}].")]
	MissingCredentials {
		/// Account whose secret document is incomplete.
		account: AccountId,
		/// Platform the secret belongs to.
		platform: Platform,
		/// Comma-separated list of missing field names.
		fields: String,
	},
	/// A shared (non-account) secret is absent from the secret store.
	#[error("Shared secret `{name}` is not configured.")]
	MissingSharedSecret {
		/// Shared secret name.
		name: String,
	},
	/// Stored credentials are not valid JSON.
	#[error("Stored credentials for {platform} are malformed.")]
	MalformedCredentials {
		/// Platform the secret belongs to.
		platform: Platform,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HMAC key could not be initialised.
	#[error("Signing key is invalid.")]
	InvalidSigningKey,
	/// An endpoint URL could not be derived.
	#[error("Endpoint `{endpoint}` could not be derived.")]
	InvalidEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint configuration failed validation.
	#[error(transparent)]
	Endpoints(#[from] crate::config::EndpointsError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Upstream payload failures.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream responded with malformed JSON that could not be parsed.
	#[error("{endpoint} returned malformed JSON.")]
	ResponseParse {
		/// Endpoint label.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Upstream responded successfully but without the expected content.
	#[error("{endpoint} returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Endpoint label.
		endpoint: &'static str,
		/// Summary of what was missing.
		message: String,
	},
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Upstream answered with a non-success HTTP status.
	#[error("HTTP error calling {endpoint}! Status: {status}.")]
	Status {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling an upstream API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling an upstream API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			ConfigError::http_client_build(e).into()
		} else {
			TransportError::from(e).into()
		}
	}
}

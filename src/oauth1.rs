//! OAuth 1.0a HMAC-SHA1 request signing for the X API.
//!
//! The signer reproduces the header the X posting API has accepted from this system's
//! predecessors, which deviates from RFC 5849 in two places:
//!
//! - parameter values are joined into the parameter string without being percent-encoded first;
//! - the signing key concatenates the raw consumer secret and token secret.
//!
//! Both deviations are invisible for the alphanumeric keys X issues, because percent-encoding is
//! the identity on `[A-Za-z0-9]`, so the header stays wire compatible. The header is rendered
//! unquoted (`key=value`), in the same order the parameters were collected.
//!
//! Query pairs of the signed URL join the parameter string but never the header; the base string
//! carries the URL without its query.
//!
//! [`OAuth1Signer::authorization_header`] draws a fresh nonce and the current timestamp on every
//! call. [`OAuth1Signer::sign`] takes both explicitly so the output can be pinned in tests.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
use url::form_urlencoded;
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

type HmacSha1 = Hmac<Sha1>;

/// Length of the random alphanumeric string that seeds each nonce.
pub const NONCE_LEN: usize = 32;
/// Signature method advertised in every header.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version advertised in every header.
pub const OAUTH_VERSION: &str = "1.0";

/// Long-lived consumer and access credentials used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
	/// Consumer API key (`oauth_consumer_key`).
	pub consumer_key: String,
	/// Consumer API key secret.
	pub consumer_secret: Secret,
	/// User access token (`oauth_token`).
	pub token: String,
	/// User access token secret.
	pub token_secret: Secret,
}
impl OAuth1Credentials {
	/// Bundles the four credential values.
	pub fn new(
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
		token: impl Into<String>,
		token_secret: impl Into<Secret>,
	) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			token: token.into(),
			token_secret: token_secret.into(),
		}
	}

	fn signing_key(&self) -> String {
		format!("{}&{}", self.consumer_secret.expose(), self.token_secret.expose())
	}
}
impl Debug for OAuth1Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth1Credentials")
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret", &self.consumer_secret)
			.field("token", &"<redacted>")
			.field("token_secret", &self.token_secret)
			.finish()
	}
}

/// Intermediate and final values produced while signing one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
	/// Sorted `key=value&...` parameter string.
	pub parameter_string: String,
	/// `METHOD&pct(url)&pct(parameter string)`.
	pub base_string: String,
	/// Percent-encoded base64 HMAC-SHA1 digest.
	pub signature: String,
	/// Complete `Authorization` header value.
	pub authorization: String,
}

/// Signs requests with a fixed set of [`OAuth1Credentials`].
#[derive(Clone, Debug)]
pub struct OAuth1Signer {
	credentials: OAuth1Credentials,
}
impl OAuth1Signer {
	/// Creates a signer for the provided credentials.
	pub fn new(credentials: OAuth1Credentials) -> Self {
		Self { credentials }
	}

	/// Returns the credentials this signer uses.
	pub fn credentials(&self) -> &OAuth1Credentials {
		&self.credentials
	}

	/// Builds an `Authorization` header for `method url` using the current time and a fresh nonce.
	pub fn authorization_header(&self, method: &str, url: &str) -> Result<String, ConfigError> {
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();
		let nonce = generate_nonce();

		self.sign(method, url, timestamp, &nonce).map(|signed| signed.authorization)
	}

	/// Signs `method url` with an explicit timestamp and nonce.
	///
	/// The nonce is used verbatim; [`generate_nonce`] already returns it in wire form.
	pub fn sign(
		&self,
		method: &str,
		url: &str,
		timestamp: i64,
		nonce: &str,
	) -> Result<SignedRequest, ConfigError> {
		let (base_url, query) = url.split_once('?').unwrap_or((url, ""));
		let query_params =
			form_urlencoded::parse(query.as_bytes()).into_owned().collect::<Vec<_>>();
		let timestamp = timestamp.to_string();
		let mut header_params = vec![
			("oauth_consumer_key", self.credentials.consumer_key.as_str()),
			("oauth_token", self.credentials.token.as_str()),
			("oauth_nonce", nonce),
			("oauth_signature_method", SIGNATURE_METHOD),
			("oauth_version", OAUTH_VERSION),
			("oauth_timestamp", timestamp.as_str()),
		];
		let sorted = header_params
			.iter()
			.copied()
			.chain(query_params.iter().map(|(key, value)| (key.as_str(), value.as_str())))
			.collect::<BTreeMap<_, _>>();
		let parameter_string = join_pairs(sorted, "&");
		let base_string = format!(
			"{}&{}&{}",
			method.to_ascii_uppercase(),
			percent_encode(base_url),
			percent_encode(&parameter_string)
		);
		let mut mac = HmacSha1::new_from_slice(self.credentials.signing_key().as_bytes())
			.map_err(|_| ConfigError::InvalidSigningKey)?;

		mac.update(base_string.as_bytes());

		let signature = percent_encode(&STANDARD.encode(mac.finalize().into_bytes()));

		header_params.push(("oauth_signature", signature.as_str()));

		let authorization = format!("OAuth {}", join_pairs(header_params, ", "));

		Ok(SignedRequest { parameter_string, base_string, signature, authorization })
	}
}

/// Generates a nonce: 32 CSPRNG alphanumerics, base64 encoded, then percent-encoded.
pub fn generate_nonce() -> String {
	let raw: String =
		rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect();

	percent_encode(&STANDARD.encode(raw.as_bytes()))
}

/// Percent-encodes every byte outside the RFC 3986 unreserved set.
pub fn percent_encode(value: &str) -> String {
	urlencoding::encode(value).into_owned()
}

fn join_pairs<'a, I>(pairs: I, separator: &str) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	pairs
		.into_iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join(separator)
}

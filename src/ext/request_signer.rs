//! Request signing contracts that let callers attach X credentials to arbitrary HTTP clients.

// crates.io
use reqwest::{RequestBuilder, header::AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TwitterAuth, error::ConfigError, oauth1::OAuth1Signer};

/// Describes how to attach a [`TwitterAuth`] to an outbound request without constraining the
/// HTTP client type.
///
/// OAuth 1.0a signatures cover the method and URL, so both travel with the request.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and injects an `Authorization` header derived from `auth`.
	fn attach_auth(
		&self,
		request: Request,
		auth: &TwitterAuth,
		method: &str,
		url: &Url,
	) -> Result<Request, Error>;
}

/// Signs reqwest requests: OAuth 1.0a headers for user context, bearer headers for app-only.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwitterRequestSigner;
impl RequestSignerExt<RequestBuilder, ConfigError> for TwitterRequestSigner {
	fn attach_auth(
		&self,
		request: RequestBuilder,
		auth: &TwitterAuth,
		method: &str,
		url: &Url,
	) -> Result<RequestBuilder, ConfigError> {
		match auth {
			TwitterAuth::OAuth1(credentials) => {
				let header = OAuth1Signer::new(credentials.clone())
					.authorization_header(method, url.as_str())?;

				Ok(request.header(AUTHORIZATION, header))
			},
			TwitterAuth::Bearer(token) => Ok(request.bearer_auth(token.expose())),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::Secret, oauth1::OAuth1Credentials};

	fn url() -> Url {
		Url::parse("https://api.twitter.com/2/tweets").expect("Fixture URL should parse.")
	}

	fn header_of(request: RequestBuilder) -> String {
		let request = request.build().expect("Request should build.");

		request
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.expect("Authorization header should be attached.")
			.to_owned()
	}

	#[test]
	fn oauth1_attaches_signed_header() {
		let auth = TwitterAuth::OAuth1(OAuth1Credentials::new("K", "S", "T", "TS"));
		let request = TwitterRequestSigner
			.attach_auth(ReqwestClient::new().post(url()), &auth, "POST", &url())
			.expect("Signing should succeed.");
		let header = header_of(request);

		assert!(header.starts_with("OAuth oauth_consumer_key=K, oauth_token=T, oauth_nonce="));
		assert!(header.contains("oauth_signature="));
	}

	#[test]
	fn bearer_attaches_bearer_header() {
		let auth = TwitterAuth::Bearer(Secret::new("abc"));
		let request = TwitterRequestSigner
			.attach_auth(ReqwestClient::new().post(url()), &auth, "POST", &url())
			.expect("Bearer attachment should succeed.");

		assert_eq!(header_of(request), "Bearer abc");
	}
}

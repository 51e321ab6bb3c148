//! LinkedIn client: member authorization, code exchange, and organization posts.

// crates.io
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope, basic::BasicClient};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::TransientError,
	http::{self, ReqwestHttpClient},
};

/// Scope requested during member authorization.
pub const POST_SCOPE: &str = "w_member_social";

const TOKEN: &str = "linkedin.token";
const POSTS: &str = "linkedin.posts";
const RESTLI_ID_HEADER: &str = "x-restli-id";

/// OAuth client registered with LinkedIn.
#[derive(Clone, Debug)]
pub struct LinkedInClient {
	/// OAuth client id.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
}

/// Access token returned by the authorization code exchange.
#[derive(Clone, Debug, Deserialize)]
pub struct LinkedInToken {
	/// Member access token.
	pub access_token: Secret,
	/// Lifetime in seconds.
	pub expires_in: i64,
}

impl LinkedInToken {
	/// Returns the instant `lead` before the token expires, counting its lifetime from `issued_at`.
	pub fn expires_at(&self, issued_at: OffsetDateTime, lead: Duration) -> Result<OffsetDateTime> {
		issued_at
			.checked_add(Duration::seconds(self.expires_in))
			.and_then(|expiry| expiry.checked_sub(lead))
			.ok_or_else(|| {
				TransientError::UnexpectedResponse {
					endpoint: TOKEN,
					message: format!("`expires_in` of {} seconds is out of range", self.expires_in),
				}
				.into()
			})
	}
}

/// Builds the member authorization URL requesting [`POST_SCOPE`].
pub fn authorization_url(endpoint: &Url, client_id: &str, redirect: &Url, state: &str) -> Url {
	let client = BasicClient::new(ClientId::new(client_id.to_owned()))
		.set_auth_uri(AuthUrl::from_url(endpoint.clone()))
		.set_redirect_uri(RedirectUrl::from_url(redirect.clone()));
	let state = state.to_owned();
	let (url, _) = client
		.authorize_url(move || CsrfToken::new(state))
		.add_scope(Scope::new(POST_SCOPE.to_owned()))
		.url();

	url
}

/// Exchanges an authorization code for a member access token.
///
/// LinkedIn omits `token_type` from this response, so the form post is issued directly.
pub async fn exchange_code(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	client: &LinkedInClient,
	code: &str,
	redirect: &Url,
) -> Result<LinkedInToken> {
	let form = [
		("grant_type", "authorization_code"),
		("code", code),
		("client_id", client.client_id.as_str()),
		("client_secret", client.client_secret.expose()),
		("redirect_uri", redirect.as_str()),
	];
	let response = http::send(TOKEN, http.post(endpoint.clone()).form(&form)).await?;

	http::decode_json(TOKEN, response).await
}

/// Publishes a text post authored by an organization page and returns the post URN.
pub async fn create_post(
	http: &ReqwestHttpClient,
	endpoint: &Url,
	version: &str,
	token: &Secret,
	organization_id: &str,
	text: &str,
) -> Result<String> {
	let body = json!({
		"author": format!("urn:li:organization:{organization_id}"),
		"commentary": text,
		"visibility": "PUBLIC",
		"distribution": {
			"feedDistribution": "MAIN_FEED",
			"targetEntities": [],
			"thirdPartyDistributionChannels": [],
		},
		"lifecycleState": "PUBLISHED",
		"isReshareDisabledByAuthor": false,
	});
	let request = http
		.post(endpoint.clone())
		.bearer_auth(token.expose())
		.header("LinkedIn-Version", version)
		.header("X-Restli-Protocol-Version", "2.0.0")
		.json(&body);
	let response = http::send(POSTS, request).await?;

	response
		.headers()
		.get(RESTLI_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(ToOwned::to_owned)
		.ok_or_else(|| {
			TransientError::UnexpectedResponse {
				endpoint: POSTS,
				message: format!("missing `{RESTLI_ID_HEADER}` header"),
			}
			.into()
		})
}

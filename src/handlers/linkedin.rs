//! LinkedIn authorization, token capture, expiry, and posting.

// crates.io
use serde_json::json;
// self
use super::{ApiResponse, Relay, respond};
use crate::{
	_prelude::*,
	account::{Account, Platform, PlatformStatus},
	auth::{AccountId, LinkedInKeys, Secret},
	error::ConfigError,
	obs::{self, OperationKind},
	platforms::linkedin::{self, LinkedInClient},
	scheduler::{Schedule, TOKEN_EXPIRATION_GROUP},
	store::SecretKey,
};

const REDIRECT_PATH: &str = "/v1/linkedin/redirect";
const API_PREFIX: &str = "/v1/";

/// Body of `authenticate_linkedin`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateLinkedIn {
	/// Account being connected.
	pub account_id: String,
}

/// Query of the LinkedIn authorization redirect.
#[derive(Clone, Debug, Deserialize)]
pub struct LinkedInCallback {
	/// Authorization code.
	pub code: String,
	/// `<redirect>|<account id>` as issued by `authenticate_linkedin`.
	pub state: String,
}

/// Input of `expire_linkedin_credentials`, delivered by the expiry timer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpireLinkedIn {
	/// Account whose token lifetime elapsed.
	pub account_id: AccountId,
}

/// Input of `send_linkedin_post`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInPostRequest {
	/// Posting account.
	pub account_id: AccountId,
	/// Post text.
	pub message: String,
}

/// Result of `send_linkedin_post`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkedInPostResult {
	/// Post URN.
	pub url: String,
}

impl Relay {
	/// Starts the member authorization flow for an account, answering `200 {"url": ...}`.
	///
	/// `origin` is the public origin of the hosting API, e.g. `https://relay.example.com`.
	pub async fn authenticate_linkedin(
		&self,
		request: AuthenticateLinkedIn,
		origin: &str,
	) -> ApiResponse {
		respond(OperationKind::AuthenticateLinkedIn, "authenticate_linkedin", async {
			let Ok(id) = AccountId::new(&request.account_id) else {
				return Ok(ApiResponse::not_found());
			};
			let account = self.require_account(&id).await?;

			linkedin_organization(&account)?;

			let redirect = Url::parse(&format!("{}{REDIRECT_PATH}", origin.trim_end_matches('/')))
				.map_err(|e| Error::invalid_request(format!("invalid origin: {e}")))?;
			let client_id = self.shared_secret(SecretKey::LINKEDIN_CLIENT_ID).await?;
			let state = format!("{redirect}|{id}");
			let url = linkedin::authorization_url(
				&self.endpoints.linkedin_authorization,
				client_id.expose(),
				&redirect,
				&state,
			);

			Ok(ApiResponse::json(200, &json!({ "url": url })))
		})
		.await
	}

	/// Completes the authorization flow: stores the member token, activates LinkedIn, registers
	/// the expiry timer, and redirects back to the account page.
	pub async fn capture_linkedin_token(&self, callback: LinkedInCallback) -> ApiResponse {
		respond(OperationKind::CaptureLinkedInToken, "capture_linkedin_token", async {
			let (redirect, account) = callback
				.state
				.rsplit_once('|')
				.ok_or_else(|| Error::invalid_request("state is missing the account"))?;
			let Ok(id) = AccountId::new(account) else {
				return Ok(ApiResponse::not_found());
			};
			let redirect_url = Url::parse(redirect)
				.map_err(|e| Error::invalid_request(format!("invalid redirect: {e}")))?;
			let mut account = self.require_account(&id).await?;
			let client = LinkedInClient {
				client_id: self.shared_secret(SecretKey::LINKEDIN_CLIENT_ID).await?.expose().into(),
				client_secret: self.shared_secret(SecretKey::LINKEDIN_CLIENT_SECRET).await?,
			};
			let token = linkedin::exchange_code(
				&self.http_client,
				&self.endpoints.linkedin_token,
				&client,
				&callback.code,
				&redirect_url,
			)
			.await?;
			let now = OffsetDateTime::now_utc();
			let fire_at = token.expires_at(now, Duration::days(1))?;

			self.secrets
				.put_secret(
					SecretKey::account(&id, Platform::LinkedIn),
					LinkedInKeys { access_token: token.access_token }.to_secret(),
				)
				.await?;

			account.linked_in.status = Some(PlatformStatus::Active);
			account.linked_in.status_timestamp = Some(now);

			self.accounts.save(account).await?;

			self.scheduler
				.upsert(Schedule::new(
					TOKEN_EXPIRATION_GROUP,
					token_timer_name(&id),
					fire_at,
					json!({ "accountId": id }),
				))
				.await?;

			tracing::info!(account = %id, %fire_at, "LinkedIn token captured.");

			let origin = redirect.split_once(API_PREFIX).map_or(redirect, |(origin, _)| origin);

			Ok(ApiResponse::redirect(format!("{origin}{API_PREFIX}accounts/{id}")))
		})
		.await
	}

	/// Marks LinkedIn credentials expired and deletes the stored token.
	pub async fn expire_linkedin_credentials(&self, request: ExpireLinkedIn) -> Result<()> {
		let kind = OperationKind::ExpireLinkedInCredentials;

		obs::observe(kind, "expire_linkedin_credentials", async {
			let id = request.account_id;
			let mut account = self.require_account(&id).await?;

			account.linked_in.status = Some(PlatformStatus::Expired);
			account.linked_in.status_timestamp = Some(OffsetDateTime::now_utc());

			self.accounts.save(account).await?;
			self.secrets.delete_secret(&SecretKey::account(&id, Platform::LinkedIn)).await?;

			tracing::info!(account = %id, "LinkedIn credentials expired.");

			Ok(())
		})
		.await
	}

	/// Publishes a post authored by the account's organization page.
	pub async fn send_linkedin_post(
		&self,
		request: LinkedInPostRequest,
	) -> Result<LinkedInPostResult> {
		obs::observe(OperationKind::SendLinkedInPost, "send_linkedin_post", async {
			let account = self.require_account(&request.account_id).await?;
			let url = self.publish_linkedin(&account, &request.message).await?;

			Ok(LinkedInPostResult { url })
		})
		.await
	}

	/// Posts `text` as the account's organization and returns the post URN.
	pub(crate) async fn publish_linkedin(&self, account: &Account, text: &str) -> Result<String> {
		let organization = linkedin_organization(account)?;
		let token = self.linkedin_token(&account.id).await?;

		linkedin::create_post(
			&self.http_client,
			&self.endpoints.linkedin_posts,
			&self.endpoints.linkedin_version,
			&token,
			organization,
			text,
		)
		.await
	}

	async fn linkedin_token(&self, account: &AccountId) -> Result<Secret> {
		let missing = || ConfigError::MissingCredentials {
			account: account.clone(),
			platform: Platform::LinkedIn,
			fields: "accessToken".into(),
		};
		let secret = self
			.secrets
			.get_secret(&SecretKey::account(account, Platform::LinkedIn))
			.await?
			.ok_or_else(missing)?;
		let keys = LinkedInKeys::from_secret(&secret)?;

		if keys.access_token.is_empty() {
			return Err(missing().into());
		}

		Ok(keys.access_token)
	}
}

/// Name of an account's LinkedIn token expiry timer.
pub fn token_timer_name(account: &AccountId) -> String {
	format!("{account}-LI-TOKEN")
}

fn linkedin_organization(account: &Account) -> Result<&str> {
	account.linked_in.organization_id.as_deref().filter(|id| !id.is_empty()).ok_or_else(|| {
		Error::PlatformNotConfigured { account: account.id.clone(), platform: Platform::LinkedIn }
	})
}

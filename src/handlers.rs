//! Relay operations.
//!
//! [`Relay`] owns the stores, scheduler, HTTP client, endpoints, and the explicit
//! [`CredentialCache`]. HTTP-facing operations return an [`ApiResponse`] the hosting runtime
//! forwards verbatim; internal operations invoked by workflows return typed results.

pub mod accounts;
pub mod campaigns;
pub mod linkedin;
pub mod planning;
pub mod publish;
pub mod response;

pub use accounts::*;
pub use campaigns::*;
pub use linkedin::*;
pub use planning::*;
pub use publish::*;
pub use response::*;

// self
use crate::{
	_prelude::*,
	account::{Account, Platform},
	auth::{AccountId, Secret, TwitterAuth, TwitterKeys},
	cache::CredentialCache,
	config::Endpoints,
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::{self, OperationKind},
	planner::SchedulingModel,
	platforms::twitter,
	scheduler::{MemoryScheduler, Scheduler, SchedulerError},
	store::{AccountStore, PostStore, SecretKey, SecretStore},
};

/// Coordinates every account, credential, and publishing operation.
#[derive(Clone)]
pub struct Relay {
	/// HTTP client wrapper used for every upstream request.
	pub http_client: ReqwestHttpClient,
	/// Account records.
	pub accounts: Arc<dyn AccountStore>,
	/// Scheduled post records.
	pub posts: Arc<dyn PostStore>,
	/// Platform and shared secrets.
	pub secrets: Arc<dyn SecretStore>,
	/// External one-shot timer service.
	pub scheduler: Arc<dyn Scheduler>,
	/// Upstream endpoints.
	pub endpoints: Endpoints,
	/// Credential cache shared by clones of this relay.
	pub cache: Arc<CredentialCache>,
	model: Option<Arc<dyn SchedulingModel>>,
}
impl Relay {
	/// Creates a relay with a default reqwest client and an in-process scheduler.
	///
	/// Production deployments attach their scheduler service with [`Relay::with_scheduler`].
	pub fn new(
		accounts: Arc<dyn AccountStore>,
		posts: Arc<dyn PostStore>,
		secrets: Arc<dyn SecretStore>,
		endpoints: Endpoints,
	) -> Self {
		Self {
			http_client: ReqwestHttpClient::default(),
			accounts,
			posts,
			secrets,
			scheduler: Arc::new(MemoryScheduler::default()),
			endpoints,
			cache: Default::default(),
			model: None,
		}
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Replaces the scheduler.
	pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
		self.scheduler = scheduler;

		self
	}

	/// Replaces the credential cache, e.g. to share one cache between relays.
	pub fn with_cache(mut self, cache: Arc<CredentialCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Uses `model` for schedule selection instead of the configured messages endpoint.
	pub fn with_model(mut self, model: Arc<dyn SchedulingModel>) -> Self {
		self.model = Some(model);

		self
	}

	async fn require_account(&self, id: &AccountId) -> Result<Account> {
		self.accounts.fetch(id).await?.ok_or_else(|| Error::AccountNotFound { account: id.clone() })
	}

	async fn shared_secret(&self, name: &'static str) -> Result<Secret> {
		self.secrets
			.get_secret(&SecretKey::shared(name))
			.await?
			.filter(|secret| !secret.is_empty())
			.ok_or_else(|| ConfigError::MissingSharedSecret { name: name.to_owned() }.into())
	}

	/// Resolves the X authentication for an account, evicting cached credentials on
	/// configuration errors and rejected bearer exchanges.
	async fn twitter_auth(&self, account: &AccountId) -> Result<TwitterAuth> {
		let guard = self.cache.guard(account);
		let _singleflight = guard.lock().await;
		let result = self.resolve_twitter_auth(account).await;

		if let Err(e) = &result
			&& (matches!(e, Error::Config(_)) || e.is_unauthorized())
		{
			self.cache.invalidate(account);
		}

		result
	}

	async fn resolve_twitter_auth(&self, account: &AccountId) -> Result<TwitterAuth> {
		let keys = match self.cache.twitter_keys(account) {
			Some(keys) => keys,
			None => {
				let keys = self.load_twitter_keys(account).await?;

				self.cache.store_twitter_keys(account, keys.clone());

				keys
			},
		};

		if let Some(credentials) = keys.oauth1(account)? {
			return Ok(TwitterAuth::OAuth1(credentials));
		}
		if let Some(token) = keys.bearer_token.as_ref().filter(|token| !token.is_empty()) {
			return Ok(TwitterAuth::Bearer(token.clone()));
		}
		if let Some(token) = self.cache.bearer_token(account) {
			return Ok(TwitterAuth::Bearer(token));
		}

		let consumer = keys.consumer(account)?;
		let token = obs::observe(OperationKind::BearerExchange, "exchange_bearer_token", async {
			twitter::exchange_bearer_token(
				&self.http_client,
				&self.endpoints.twitter_token,
				&consumer,
			)
			.await
		})
		.await?;

		self.cache.store_bearer_token(account, token.clone());

		Ok(TwitterAuth::Bearer(token))
	}

	async fn load_twitter_keys(&self, account: &AccountId) -> Result<TwitterKeys> {
		let secret =
			self.secrets.get_secret(&SecretKey::account(account, Platform::Twitter)).await?;
		let keys = match secret {
			Some(secret) => TwitterKeys::from_secret(&secret)?,
			None => TwitterKeys::default(),
		};

		if keys.is_empty() {
			return Err(ConfigError::MissingCredentials {
				account: account.clone(),
				platform: Platform::Twitter,
				fields: "apiKey, apiKeySecret, accessToken, accessTokenSecret".into(),
			}
			.into());
		}

		Ok(keys)
	}

	/// Deletes a timer, logging instead of failing when the scheduler cannot remove it.
	async fn remove_schedule(&self, group: &str, name: &str) {
		match self.scheduler.delete(group, name).await {
			Ok(()) => tracing::debug!(group, name, "Deleted schedule."),
			Err(SchedulerError::NotFound { .. }) =>
				tracing::debug!(group, name, "Schedule was already absent."),
			Err(e) => tracing::warn!(group, name, error = %e, "Failed to delete schedule."),
		}
	}

	/// Evicts cached X credentials when `result` carries an authentication failure.
	fn evict_on_unauthorized<T>(&self, account: &AccountId, result: Result<T>) -> Result<T> {
		if let Err(e) = &result
			&& e.is_unauthorized()
		{
			self.cache.invalidate(account);
		}

		result
	}
}
impl Debug for Relay {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("endpoints", &self.endpoints)
			.field("cache", &self.cache)
			.field("custom_model", &self.model.is_some())
			.finish()
	}
}

/// Parses an account id taken from a request path; malformed ids address no account.
pub(crate) fn path_account_id(raw: &str) -> Option<AccountId> {
	AccountId::new(raw).ok()
}

//! Account management operations.

// crates.io
use serde_json::json;
// self
use super::{ApiResponse, Relay, linkedin::token_timer_name, path_account_id, respond};
use crate::{
	_prelude::*,
	account::{Account, Platform, PlatformStatus, TwitterProfile},
	auth::{AccountId, Secret, TwitterKeys},
	obs::OperationKind,
	pages,
	platforms::discord,
	scheduler::{SOCIAL_GROUP, TOKEN_EXPIRATION_GROUP},
	store::{InsertOutcome, SecretKey},
};

/// Body of `add_account`.
#[derive(Clone, Debug, Deserialize)]
pub struct NewAccount {
	/// Requested identifier; lowercased before storage.
	pub id: String,
	/// Display name.
	pub name: String,
}

/// Body of `update_account`. Absent blocks leave the matching platform untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
	/// Twitter/X changes.
	#[serde(default)]
	pub twitter: Option<TwitterUpdate>,
	/// LinkedIn changes.
	#[serde(default)]
	pub linked_in: Option<LinkedInUpdate>,
	/// Discord changes.
	#[serde(default)]
	pub discord: Option<DiscordUpdate>,
}

/// Twitter/X block of an [`AccountUpdate`]. Empty strings count as absent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterUpdate {
	/// Clears the block and deletes the stored keys.
	#[serde(default)]
	pub remove_credentials: bool,
	/// Account handle.
	#[serde(default)]
	pub handle: Option<String>,
	/// Consumer API key.
	#[serde(default)]
	pub api_key: Option<String>,
	/// Consumer API key secret.
	#[serde(default)]
	pub api_key_secret: Option<String>,
	/// User access token.
	#[serde(default)]
	pub access_token: Option<String>,
	/// User access token secret.
	#[serde(default)]
	pub access_token_secret: Option<String>,
	/// Optional pre-issued bearer token.
	#[serde(default)]
	pub bearer_token: Option<String>,
}
impl TwitterUpdate {
	fn keys(&self) -> TwitterKeys {
		let secret = |field: &Option<String>| non_empty(field.clone()).map(Secret::new);

		TwitterKeys {
			api_key: secret(&self.api_key),
			api_key_secret: secret(&self.api_key_secret),
			access_token: secret(&self.access_token),
			access_token_secret: secret(&self.access_token_secret),
			bearer_token: secret(&self.bearer_token),
		}
	}
}

/// LinkedIn block of an [`AccountUpdate`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInUpdate {
	/// Withdraws the member token and its expiry timer.
	#[serde(default)]
	pub remove_credentials: bool,
	/// Organization page; absent removes the stored value.
	#[serde(default)]
	pub organization_id: Option<String>,
}

/// Discord block of an [`AccountUpdate`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscordUpdate {
	/// Default channel; absent removes the stored value.
	#[serde(default)]
	pub channel: Option<String>,
}

impl Relay {
	/// Creates an account, answering `201 {"id": <normalized id>}`.
	pub async fn add_account(&self, request: NewAccount) -> ApiResponse {
		respond(OperationKind::AddAccount, "add_account", async {
			let id = AccountId::new(&request.id)
				.map_err(|e| Error::invalid_request(e.to_string()))?;
			let account = Account::new(id.clone(), request.name, OffsetDateTime::now_utc());

			match self.accounts.insert(account).await? {
				InsertOutcome::Inserted => {
					tracing::info!(account = %id, "Account created.");

					Ok(ApiResponse::json(201, &json!({ "id": id })))
				},
				InsertOutcome::AlreadyExists => Err(Error::AccountExists { account: id }),
			}
		})
		.await
	}

	/// Applies partial platform updates and answers `204`.
	pub async fn update_account(&self, id: &str, update: AccountUpdate) -> ApiResponse {
		respond(OperationKind::UpdateAccount, "update_account", async {
			let Some(id) = path_account_id(id) else {
				return Ok(ApiResponse::not_found());
			};
			let mut account = self.require_account(&id).await?;
			let discord_channel = update.discord.map(|discord| non_empty(discord.channel));

			if let Some(channel) = discord_channel
				.as_ref()
				.and_then(Option::as_deref)
				.filter(|channel| !discord::is_snowflake(channel))
			{
				return Err(Error::invalid_request(format!(
					"Discord channel `{channel}` is not a valid id"
				)));
			}
			if let Some(twitter) = update.twitter {
				self.apply_twitter_update(&mut account, twitter).await?;
			}
			if let Some(linked_in) = update.linked_in {
				self.apply_linkedin_update(&mut account, linked_in).await?;
			}
			if let Some(channel) = discord_channel {
				account.discord.channel = channel;
			}
			if !self.accounts.save(account).await? {
				return Err(Error::AccountNotFound { account: id });
			}

			Ok(ApiResponse::no_content())
		})
		.await
	}

	/// Deletes an account with its secrets, LinkedIn expiry timer, and scheduled posts.
	pub async fn delete_account(&self, id: &str) -> ApiResponse {
		respond(OperationKind::DeleteAccount, "delete_account", async {
			let Some(id) = path_account_id(id) else {
				return Ok(ApiResponse::not_found());
			};

			if self.accounts.delete(&id).await?.is_none() {
				return Err(Error::AccountNotFound { account: id });
			}

			for platform in [Platform::Twitter, Platform::LinkedIn] {
				self.secrets.delete_secret(&SecretKey::account(&id, platform)).await?;
			}

			self.remove_schedule(TOKEN_EXPIRATION_GROUP, &token_timer_name(&id)).await;

			for post in self.posts.posts_for_account(&id).await? {
				self.posts.delete_post(&post.id).await?;
				self.remove_schedule(SOCIAL_GROUP, &post.schedule_name()).await;
			}

			self.cache.invalidate(&id);

			tracing::info!(account = %id, "Account deleted.");

			Ok(ApiResponse::no_content())
		})
		.await
	}

	/// Renders the X credential form for an account.
	pub async fn account_config_page(&self, id: &str) -> ApiResponse {
		respond(OperationKind::AccountConfigPage, "account_config_page", async {
			let Some(id) = path_account_id(id) else {
				return Ok(ApiResponse::not_found());
			};
			let account = self.require_account(&id).await?;

			Ok(ApiResponse::html(pages::account_config_form(&account.name, &account.id)))
		})
		.await
	}

	/// Renders the account list.
	pub async fn accounts_page(&self) -> ApiResponse {
		respond(OperationKind::AccountsPage, "accounts_page", async {
			let accounts = self.accounts.list().await?;

			Ok(ApiResponse::html(pages::accounts_page(&accounts)))
		})
		.await
	}

	async fn apply_twitter_update(
		&self,
		account: &mut Account,
		update: TwitterUpdate,
	) -> Result<()> {
		let key = SecretKey::account(&account.id, Platform::Twitter);

		if update.remove_credentials {
			account.twitter = TwitterProfile::default();

			self.secrets.delete_secret(&key).await?;
			self.cache.invalidate(&account.id);

			return Ok(());
		}

		let keys = update.keys();
		let Some(handle) = non_empty(update.handle) else {
			return Ok(());
		};

		if keys.is_complete() {
			account.twitter =
				TwitterProfile { handle: Some(handle), status: Some(PlatformStatus::Active) };

			self.secrets.put_secret(key, keys.to_secret()).await?;
			self.cache.invalidate(&account.id);
		} else if account.twitter.is_active() {
			if keys.is_empty() {
				account.twitter.handle = Some(handle);
			}
		} else {
			account.twitter =
				TwitterProfile { handle: Some(handle), status: Some(PlatformStatus::Inactive) };
		}

		Ok(())
	}

	async fn apply_linkedin_update(
		&self,
		account: &mut Account,
		update: LinkedInUpdate,
	) -> Result<()> {
		if update.remove_credentials {
			account.linked_in.status = Some(PlatformStatus::Inactive);
			account.linked_in.status_timestamp = Some(OffsetDateTime::now_utc());

			self.secrets.delete_secret(&SecretKey::account(&account.id, Platform::LinkedIn)).await?;
			self.remove_schedule(TOKEN_EXPIRATION_GROUP, &token_timer_name(&account.id)).await;
		} else {
			account.linked_in.organization_id = non_empty(update.organization_id);
		}

		Ok(())
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

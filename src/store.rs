//! Storage contracts and built-in implementations for accounts, posts, and secrets.
//!
//! Accounts and posts live in a key-value store; platform credentials live in a separate secret
//! store and are never embedded in account records. Both in-memory and file-backed
//! implementations serve all three contracts.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	account::{Account, Platform, ScheduledPost},
	auth::{AccountId, PostId, Secret},
};

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value contract for account records.
pub trait AccountStore
where
	Self: Send + Sync,
{
	/// Inserts the account unless one already exists under the same identifier.
	fn insert(&self, account: Account) -> StoreFuture<'_, InsertOutcome>;

	/// Fetches the account, if present.
	fn fetch<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>>;

	/// Lists every account ordered by display name.
	fn list(&self) -> StoreFuture<'_, Vec<Account>>;

	/// Replaces an existing account; returns `false` when no record matched.
	fn save(&self, account: Account) -> StoreFuture<'_, bool>;

	/// Deletes the account, returning the removed record.
	fn delete<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>>;
}

/// Key-value contract for scheduled post records.
pub trait PostStore
where
	Self: Send + Sync,
{
	/// Persists or replaces a post.
	fn save_post(&self, post: ScheduledPost) -> StoreFuture<'_, ()>;

	/// Returns the posts indexed under an `<account>#<campaign>` key.
	fn posts_for_campaign<'a>(
		&'a self,
		campaign_key: &'a str,
	) -> StoreFuture<'a, Vec<ScheduledPost>>;

	/// Returns an account's posts ordered by publication instant.
	fn posts_for_account<'a>(
		&'a self,
		account: &'a AccountId,
	) -> StoreFuture<'a, Vec<ScheduledPost>>;

	/// Deletes a post, returning the removed record.
	fn delete_post<'a>(&'a self, id: &'a PostId) -> StoreFuture<'a, Option<ScheduledPost>>;
}

/// Secret-store contract for credential documents.
pub trait SecretStore
where
	Self: Send + Sync,
{
	/// Stores or overwrites a secret.
	fn put_secret(&self, key: SecretKey, value: Secret) -> StoreFuture<'_, ()>;

	/// Fetches a secret, if present.
	fn get_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, Option<Secret>>;

	/// Deletes a secret; returns `false` when nothing was stored.
	fn delete_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, bool>;
}

/// Result of a conditional insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The record was written.
	Inserted,
	/// A record already existed under the same key and was left untouched.
	AlreadyExists,
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Address of a secret document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKey {
	/// Per-account platform credentials.
	Account {
		/// Owning account.
		account: AccountId,
		/// Platform the credentials belong to.
		platform: Platform,
	},
	/// Process-wide credentials such as OAuth client secrets or bot tokens.
	Shared(String),
}
impl SecretKey {
	/// Shared secret holding the LinkedIn OAuth client id.
	pub const LINKEDIN_CLIENT_ID: &'static str = "clientId";
	/// Shared secret holding the LinkedIn OAuth client secret.
	pub const LINKEDIN_CLIENT_SECRET: &'static str = "clientSecret";
	/// Shared secret holding the Discord bot token.
	pub const DISCORD_BOT_TOKEN: &'static str = "discord";
	/// Shared secret holding the scheduling model API key.
	pub const MODEL_API_KEY: &'static str = "modelApiKey";

	/// Builds a per-account key.
	pub fn account(account: &AccountId, platform: Platform) -> Self {
		Self::Account { account: account.clone(), platform }
	}

	/// Builds a shared key.
	pub fn shared(name: impl Into<String>) -> Self {
		Self::Shared(name.into())
	}

	/// Returns the hierarchical path, e.g. `/social-media/acme/twitter`.
	pub fn path(&self) -> String {
		match self {
			Self::Account { account, platform } =>
				format!("/social-media/{account}/{}", platform.secret_segment()),
			Self::Shared(name) => format!("/social-media/shared/{name}"),
		}
	}
}
impl Display for SecretKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.path())
	}
}

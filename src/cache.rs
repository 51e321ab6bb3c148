//! Explicit credential cache owned by a [`Relay`](crate::handlers::Relay).
//!
//! The cache holds decoded X secret documents, exchanged app-only bearer tokens, and uploaded
//! media ids. Entries live as long as the cache object. Callers evict an account with
//! [`CredentialCache::invalidate`] after a configuration error or an authentication failure from
//! the posting API. Per-account singleflight guards make concurrent callers share one secret
//! fetch or bearer exchange.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, Secret, TwitterKeys},
};

type Guards = Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>;

/// Process-local cache of fetched credentials, bearer tokens, and media ids.
#[derive(Default)]
pub struct CredentialCache {
	twitter_keys: RwLock<HashMap<AccountId, TwitterKeys>>,
	bearer_tokens: RwLock<HashMap<AccountId, Secret>>,
	media_ids: RwLock<HashMap<(AccountId, String), String>>,
	guards: Guards,
}
impl CredentialCache {
	/// Returns the cached X secret document for an account.
	pub fn twitter_keys(&self, account: &AccountId) -> Option<TwitterKeys> {
		self.twitter_keys.read().get(account).cloned()
	}

	/// Caches an X secret document.
	pub fn store_twitter_keys(&self, account: &AccountId, keys: TwitterKeys) {
		self.twitter_keys.write().insert(account.clone(), keys);
	}

	/// Returns the cached app-only bearer token for an account.
	pub fn bearer_token(&self, account: &AccountId) -> Option<Secret> {
		self.bearer_tokens.read().get(account).cloned()
	}

	/// Caches an app-only bearer token.
	pub fn store_bearer_token(&self, account: &AccountId, token: Secret) {
		self.bearer_tokens.write().insert(account.clone(), token);
	}

	/// Returns the media id an account previously uploaded for a source URL.
	pub fn media_id(&self, account: &AccountId, source: &str) -> Option<String> {
		self.media_ids.read().get(&(account.clone(), source.to_owned())).cloned()
	}

	/// Remembers the media id an account uploaded for a source URL.
	pub fn store_media_id(
		&self,
		account: &AccountId,
		source: impl Into<String>,
		media_id: impl Into<String>,
	) {
		self.media_ids.write().insert((account.clone(), source.into()), media_id.into());
	}

	/// Drops an account's secret document and bearer token, and its singleflight guard when no
	/// caller holds it.
	///
	/// Returns `true` when any credential was evicted.
	pub fn invalidate(&self, account: &AccountId) -> bool {
		let keys = self.twitter_keys.write().remove(account).is_some();
		let bearer = self.bearer_tokens.write().remove(account).is_some();
		let mut guards = self.guards.lock();

		if guards.get(account).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(account);
		}

		drop(guards);

		if keys || bearer {
			tracing::debug!(%account, "Evicted cached X credentials.");
		}

		keys || bearer
	}

	/// Returns (and creates on demand) the singleflight guard for an account.
	pub(crate) fn guard(&self, account: &AccountId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(account.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for CredentialCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("twitter_keys", &self.twitter_keys.read().len())
			.field("bearer_tokens", &self.bearer_tokens.read().len())
			.field("media_ids", &self.media_ids.read().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn account(id: &str) -> AccountId {
		AccountId::new(id).expect("Account fixture should be valid.")
	}

	#[test]
	fn invalidate_drops_keys_and_bearer_only() {
		let cache = CredentialCache::default();
		let acme = account("acme");

		cache.store_twitter_keys(&acme, TwitterKeys::default());
		cache.store_bearer_token(&acme, Secret::new("abc"));
		cache.store_media_id(&acme, "https://cdn.example.com/a.png", "m-1");

		assert!(cache.invalidate(&acme));
		assert!(cache.twitter_keys(&acme).is_none());
		assert!(cache.bearer_token(&acme).is_none());
		assert_eq!(
			cache.media_id(&acme, "https://cdn.example.com/a.png").as_deref(),
			Some("m-1")
		);
		assert!(!cache.invalidate(&acme), "Second eviction finds nothing.");
	}

	#[test]
	fn media_ids_are_scoped_per_account() {
		let cache = CredentialCache::default();
		let source = "https://cdn.example.com/a.png";

		cache.store_media_id(&account("alice"), source, "m-1");

		assert_eq!(cache.media_id(&account("alice"), source).as_deref(), Some("m-1"));
		assert!(cache.media_id(&account("bob"), source).is_none());
	}

	#[test]
	fn invalidate_prunes_idle_guards_only() {
		let cache = CredentialCache::default();
		let acme = account("acme");
		let held = cache.guard(&acme);

		cache.invalidate(&acme);

		assert!(Arc::ptr_eq(&held, &cache.guard(&acme)), "Held guards survive eviction.");

		drop(held);
		cache.invalidate(&acme);

		assert!(cache.guards.lock().is_empty());
	}

	#[test]
	fn guards_are_shared_per_account() {
		let cache = CredentialCache::default();
		let first = cache.guard(&account("acme"));
		let second = cache.guard(&account("ACME"));
		let other = cache.guard(&account("globex"));

		assert!(Arc::ptr_eq(&first, &second));
		assert!(!Arc::ptr_eq(&first, &other));
	}

	#[test]
	fn debug_hides_cached_values() {
		let cache = CredentialCache::default();

		cache.store_bearer_token(&account("acme"), Secret::new("super-secret"));

		let rendered = format!("{cache:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("bearer_tokens: 1"));
	}
}

//! Simple file-backed store for single-host deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	account::{Account, ScheduledPost},
	auth::{AccountId, PostId, Secret},
	store::{
		AccountStore, InsertOutcome, PostStore, SecretKey, SecretStore, StoreError, StoreFuture,
		memory::Tables,
	},
};

/// Persists accounts, posts, and secrets to one JSON snapshot after each mutation.
///
/// Secrets are written in clear text; point the store at a path with restrictive permissions.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Tables>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Returns the snapshot location.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Tables, StoreError> {
		if !path.exists() {
			return Ok(Tables::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Tables::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Tables) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies a mutation and persists the snapshot when `changed` reports a modification.
	fn mutate<T>(
		&self,
		f: impl FnOnce(&mut Tables) -> T,
		changed: impl FnOnce(&T) -> bool,
	) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let outcome = f(&mut guard);

		if changed(&outcome) {
			self.persist_locked(&guard)?;
		}

		Ok(outcome)
	}
}
impl AccountStore for FileStore {
	fn insert(&self, account: Account) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move {
			self.mutate(
				|tables| tables.insert_account(account),
				|outcome| matches!(outcome, InsertOutcome::Inserted),
			)
		})
	}

	fn fetch<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>> {
		Box::pin(async move { Ok(self.inner.read().accounts.get(id).cloned()) })
	}

	fn list(&self) -> StoreFuture<'_, Vec<Account>> {
		Box::pin(async move { Ok(self.inner.read().list_accounts()) })
	}

	fn save(&self, account: Account) -> StoreFuture<'_, bool> {
		Box::pin(async move { self.mutate(|tables| tables.save_account(account), |saved| *saved) })
	}

	fn delete<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>> {
		Box::pin(async move { self.mutate(|tables| tables.accounts.remove(id), Option::is_some) })
	}
}
impl PostStore for FileStore {
	fn save_post(&self, post: ScheduledPost) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|tables| tables.posts.insert(post.id.clone(), post), |_| true)?;

			Ok(())
		})
	}

	fn posts_for_campaign<'a>(
		&'a self,
		campaign_key: &'a str,
	) -> StoreFuture<'a, Vec<ScheduledPost>> {
		Box::pin(async move { Ok(self.inner.read().posts_for_campaign(campaign_key)) })
	}

	fn posts_for_account<'a>(
		&'a self,
		account: &'a AccountId,
	) -> StoreFuture<'a, Vec<ScheduledPost>> {
		Box::pin(async move { Ok(self.inner.read().posts_for_account(account)) })
	}

	fn delete_post<'a>(&'a self, id: &'a PostId) -> StoreFuture<'a, Option<ScheduledPost>> {
		Box::pin(async move { self.mutate(|tables| tables.posts.remove(id), Option::is_some) })
	}
}
impl SecretStore for FileStore {
	fn put_secret(&self, key: SecretKey, value: Secret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|tables| tables.secrets.insert(key, value), |_| true)?;

			Ok(())
		})
	}

	fn get_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, Option<Secret>> {
		Box::pin(async move { Ok(self.inner.read().secrets.get(key).cloned()) })
	}

	fn delete_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			self.mutate(|tables| tables.secrets.remove(key).is_some(), |removed| *removed)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use time::macros::datetime;
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::account::Platform;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"social_relay_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let id = AccountId::new("acme").expect("Account fixture should be valid.");
		let key = SecretKey::account(&id, Platform::Twitter);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.insert(Account::new(id.clone(), "Acme", datetime!(2024-01-01 0:00 UTC))))
			.expect("Failed to insert fixture account.");
		rt.block_on(store.put_secret(key.clone(), Secret::new("{\"apiKey\":\"k\"}")))
			.expect("Failed to store fixture secret.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let account = rt
			.block_on(reopened.fetch(&id))
			.expect("Failed to fetch fixture account.")
			.expect("File store lost account after reopen.");
		let secret = rt
			.block_on(reopened.get_secret(&key))
			.expect("Failed to fetch fixture secret.")
			.expect("File store lost secret after reopen.");

		assert_eq!(account.name, "Acme");
		assert_eq!(secret.expose(), "{\"apiKey\":\"k\"}");

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn duplicate_insert_does_not_touch_disk() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let id = AccountId::new("acme").expect("Account fixture should be valid.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let fixture = Account::new(id, "Acme", datetime!(2024-01-01 0:00 UTC));

		assert_eq!(
			rt.block_on(store.insert(fixture.clone())).expect("First insert should succeed."),
			InsertOutcome::Inserted
		);
		assert_eq!(
			rt.block_on(store.insert(fixture)).expect("Second insert should succeed."),
			InsertOutcome::AlreadyExists
		);
		assert!(store.path().exists());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}

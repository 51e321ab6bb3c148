//! Thread-safe in-memory store for local development and tests.

// self
use crate::{
	_prelude::*,
	account::{Account, ScheduledPost},
	auth::{AccountId, PostId, Secret},
	store::{
		AccountStore, InsertOutcome, PostStore, SecretKey, SecretStore, StoreError, StoreFuture,
	},
};

/// Plain maps shared by the in-memory and file-backed stores.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
	pub(crate) accounts: BTreeMap<AccountId, Account>,
	pub(crate) posts: BTreeMap<PostId, ScheduledPost>,
	#[serde(with = "secret_entries")]
	pub(crate) secrets: BTreeMap<SecretKey, Secret>,
}
impl Tables {
	pub(crate) fn insert_account(&mut self, account: Account) -> InsertOutcome {
		if self.accounts.contains_key(&account.id) {
			return InsertOutcome::AlreadyExists;
		}

		self.accounts.insert(account.id.clone(), account);

		InsertOutcome::Inserted
	}

	pub(crate) fn list_accounts(&self) -> Vec<Account> {
		let mut accounts = self.accounts.values().cloned().collect::<Vec<_>>();

		accounts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

		accounts
	}

	pub(crate) fn save_account(&mut self, account: Account) -> bool {
		match self.accounts.get_mut(&account.id) {
			Some(existing) => {
				*existing = account;

				true
			},
			None => false,
		}
	}

	pub(crate) fn posts_for_campaign(&self, campaign_key: &str) -> Vec<ScheduledPost> {
		self.posts
			.values()
			.filter(|post| post.campaign_key().as_deref() == Some(campaign_key))
			.cloned()
			.collect()
	}

	pub(crate) fn posts_for_account(&self, account: &AccountId) -> Vec<ScheduledPost> {
		let mut posts = self
			.posts
			.values()
			.filter(|post| &post.account == account)
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by_key(|post| post.scheduled_for);

		posts
	}
}

type SharedTables = Arc<RwLock<Tables>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SharedTables);
impl MemoryStore {
	fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
		f(&self.0.read())
	}

	fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
		f(&mut self.0.write())
	}
}
impl AccountStore for MemoryStore {
	fn insert(&self, account: Account) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move { Ok(self.write(|tables| tables.insert_account(account))) })
	}

	fn fetch<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>> {
		Box::pin(async move { Ok(self.read(|tables| tables.accounts.get(id).cloned())) })
	}

	fn list(&self) -> StoreFuture<'_, Vec<Account>> {
		Box::pin(async move { Ok(self.read(Tables::list_accounts)) })
	}

	fn save(&self, account: Account) -> StoreFuture<'_, bool> {
		Box::pin(async move { Ok(self.write(|tables| tables.save_account(account))) })
	}

	fn delete<'a>(&'a self, id: &'a AccountId) -> StoreFuture<'a, Option<Account>> {
		Box::pin(async move { Ok(self.write(|tables| tables.accounts.remove(id))) })
	}
}
impl PostStore for MemoryStore {
	fn save_post(&self, post: ScheduledPost) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.write(|tables| tables.posts.insert(post.id.clone(), post));

			Ok(())
		})
	}

	fn posts_for_campaign<'a>(
		&'a self,
		campaign_key: &'a str,
	) -> StoreFuture<'a, Vec<ScheduledPost>> {
		Box::pin(async move { Ok(self.read(|tables| tables.posts_for_campaign(campaign_key))) })
	}

	fn posts_for_account<'a>(
		&'a self,
		account: &'a AccountId,
	) -> StoreFuture<'a, Vec<ScheduledPost>> {
		Box::pin(async move { Ok(self.read(|tables| tables.posts_for_account(account))) })
	}

	fn delete_post<'a>(&'a self, id: &'a PostId) -> StoreFuture<'a, Option<ScheduledPost>> {
		Box::pin(async move { Ok(self.write(|tables| tables.posts.remove(id))) })
	}
}
impl SecretStore for MemoryStore {
	fn put_secret(&self, key: SecretKey, value: Secret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.write(|tables| tables.secrets.insert(key, value));

			Ok(())
		})
	}

	fn get_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, Option<Secret>> {
		Box::pin(async move { Ok(self.read(|tables| tables.secrets.get(key).cloned())) })
	}

	fn delete_secret<'a>(&'a self, key: &'a SecretKey) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.write(|tables| tables.secrets.remove(key).is_some())) })
	}
}

/// Serializes secret maps as entry lists because their keys are not strings.
mod secret_entries {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use super::*;

	pub(super) fn serialize<S>(
		map: &BTreeMap<SecretKey, Secret>,
		serializer: S,
	) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_seq(map.iter())
	}

	pub(super) fn deserialize<'de, D>(
		deserializer: D,
	) -> Result<BTreeMap<SecretKey, Secret>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let entries = Vec::<(SecretKey, Secret)>::deserialize(deserializer)?;

		Ok(entries.into_iter().collect())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::account::Platform;

	fn account(id: &str, name: &str) -> Account {
		Account::new(
			AccountId::new(id).expect("Account fixture should be valid."),
			name,
			datetime!(2024-01-01 0:00 UTC),
		)
	}

	#[tokio::test]
	async fn insert_is_conditional() {
		let store = MemoryStore::default();

		assert_eq!(
			store.insert(account("acme", "Acme")).await.expect("Insert should succeed."),
			InsertOutcome::Inserted
		);
		assert_eq!(
			store.insert(account("ACME", "Other")).await.expect("Insert should succeed."),
			InsertOutcome::AlreadyExists
		);

		let stored = store
			.fetch(&AccountId::new("acme").expect("Lookup id should be valid."))
			.await
			.expect("Fetch should succeed.")
			.expect("Account should exist.");

		assert_eq!(stored.name, "Acme");
	}

	#[tokio::test]
	async fn list_orders_by_name_and_save_requires_existing() {
		let store = MemoryStore::default();

		store.insert(account("zeta", "Alpha")).await.expect("Insert should succeed.");
		store.insert(account("alpha", "Zeta")).await.expect("Insert should succeed.");

		let names = store
			.list()
			.await
			.expect("List should succeed.")
			.into_iter()
			.map(|account| account.name)
			.collect::<Vec<_>>();

		assert_eq!(names, ["Alpha", "Zeta"]);
		assert!(!store.save(account("ghost", "Ghost")).await.expect("Save should succeed."));
	}

	#[tokio::test]
	async fn secrets_round_trip_and_delete() {
		let store = MemoryStore::default();
		let key = SecretKey::account(
			&AccountId::new("acme").expect("Account fixture should be valid."),
			Platform::Twitter,
		);

		store.put_secret(key.clone(), Secret::new("{}")).await.expect("Put should succeed.");

		assert_eq!(
			store
				.get_secret(&key)
				.await
				.expect("Get should succeed.")
				.map(|s| s.expose().to_owned()),
			Some("{}".to_owned())
		);
		assert!(store.delete_secret(&key).await.expect("Delete should succeed."));
		assert!(!store.delete_secret(&key).await.expect("Delete should succeed."));
	}

	#[test]
	fn tables_serialize_secret_entries_as_pairs() {
		let mut tables = Tables::default();

		tables.secrets.insert(SecretKey::shared("discord"), Secret::new("bot"));

		let json = serde_json::to_value(&tables).expect("Tables should serialize.");

		assert_eq!(json["secrets"][0][0]["shared"], "discord");
		assert_eq!(json["secrets"][0][1], "bot");

		let back: Tables = serde_json::from_value(json).expect("Tables should deserialize.");

		assert_eq!(back.secrets.len(), 1);
	}
}

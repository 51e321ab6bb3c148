//! Account, credential, and publishing toolkit for Twitter/X, LinkedIn, and Discord.
//!
//! The crate exposes a [`handlers::Relay`] that owns the stores, scheduler, HTTP client, and an
//! explicit [`cache::CredentialCache`]. Every operation is independent: it parses its input,
//! touches the account/secret stores, calls at most one upstream API, and returns a formatted
//! response. X requests are authenticated with the OAuth 1.0a signer in [`oauth1`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod account;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod ext;
pub mod handlers;
pub mod http;
pub mod oauth1;
pub mod obs;
pub mod pages;
pub mod planner;
pub mod platforms;
pub mod scheduler;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::Endpoints,
		handlers::Relay,
		http::ReqwestHttpClient,
		scheduler::MemoryScheduler,
		store::{AccountStore, MemoryStore, PostStore, SecretStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Handles returned by [`build_test_relay`] so tests can inspect backend state directly.
	#[derive(Clone, Debug)]
	pub struct TestBackends {
		/// Shared in-memory store backing accounts, posts, and secrets.
		pub store: Arc<MemoryStore>,
		/// In-memory scheduler receiving timer upserts and deletions.
		pub scheduler: Arc<MemoryScheduler>,
	}

	/// Constructs a [`Relay`] backed by in-memory stores, an in-memory scheduler, and the
	/// insecure reqwest transport used across integration tests.
	pub fn build_test_relay(endpoints: Endpoints) -> (Relay, TestBackends) {
		let store = Arc::new(MemoryStore::default());
		let scheduler = Arc::new(MemoryScheduler::default());
		let accounts: Arc<dyn AccountStore> = store.clone();
		let posts: Arc<dyn PostStore> = store.clone();
		let secrets: Arc<dyn SecretStore> = store.clone();
		let relay = Relay::new(accounts, posts, secrets, endpoints)
			.with_http_client(test_reqwest_http_client())
			.with_scheduler(scheduler.clone());

		(relay, TestBackends { store, scheduler })
	}

	/// Builds [`Endpoints`] that route every upstream call through `server_url`, typically
	/// `|path| server.url(path)` on an `httpmock` server.
	pub fn mock_endpoints(server_url: impl Fn(&str) -> String) -> Endpoints {
		let url =
			|path: &str| Url::parse(&server_url(path)).expect("Mock endpoint URL should parse.");

		Endpoints::builder()
			.twitter_tweets(url("/2/tweets"))
			.twitter_media_upload(url("/1.1/media/upload.json"))
			.twitter_token(url("/oauth2/token"))
			.linkedin_authorization(url("/oauth/v2/authorization"))
			.linkedin_token(url("/oauth/v2/accessToken"))
			.linkedin_posts(url("/rest/posts"))
			.discord_api(url("/api/v10/"))
			.model_messages(url("/v1/messages"))
			.build()
			.expect("Mock endpoints should validate.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

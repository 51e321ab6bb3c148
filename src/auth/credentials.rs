//! Per-platform credential documents as persisted in the secret store.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	account::Platform,
	auth::{AccountId, Secret},
	error::ConfigError,
	oauth1::OAuth1Credentials,
};

/// Consumer (application) key pair issued by the X developer portal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerKeys {
	/// Consumer API key.
	pub key: Secret,
	/// Consumer API key secret.
	pub secret: Secret,
}

/// Authentication mode selected for an X request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TwitterAuth {
	/// User-context OAuth 1.0a signing.
	OAuth1(OAuth1Credentials),
	/// App-only bearer token.
	Bearer(Secret),
}

/// X secret document: `{apiKey, apiKeySecret, accessToken, accessTokenSecret, bearerToken?}`.
///
/// Every field is optional on the wire so incomplete documents can be reported precisely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterKeys {
	/// Consumer API key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key: Option<Secret>,
	/// Consumer API key secret.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key_secret: Option<Secret>,
	/// User access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<Secret>,
	/// User access token secret.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token_secret: Option<Secret>,
	/// Pre-issued app-only bearer token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bearer_token: Option<Secret>,
}
impl TwitterKeys {
	/// Parses a stored secret, tolerating documents that were JSON-encoded twice.
	pub fn from_secret(raw: &Secret) -> Result<Self, ConfigError> {
		decode_document(Platform::Twitter, raw.expose())
	}

	/// Serializes the document for the secret store.
	pub fn to_secret(&self) -> Secret {
		Secret::new(encode_document(self))
	}

	/// Returns the consumer pair or a configuration error naming the missing fields.
	pub fn consumer(&self, account: &AccountId) -> Result<ConsumerKeys, ConfigError> {
		match (present(&self.api_key), present(&self.api_key_secret)) {
			(Some(key), Some(secret)) =>
				Ok(ConsumerKeys { key: key.clone(), secret: secret.clone() }),
			_ => Err(ConfigError::MissingCredentials {
				account: account.clone(),
				platform: Platform::Twitter,
				fields: "apiKey, apiKeySecret".into(),
			}),
		}
	}

	/// Returns OAuth 1.0a credentials when both the consumer and access pairs are present.
	///
	/// An incomplete consumer pair is a configuration error; an incomplete access pair yields
	/// `None` so callers can fall back to the app-only bearer flow.
	pub fn oauth1(&self, account: &AccountId) -> Result<Option<OAuth1Credentials>, ConfigError> {
		let consumer = self.consumer(account)?;

		match (present(&self.access_token), present(&self.access_token_secret)) {
			(Some(token), Some(token_secret)) => Ok(Some(OAuth1Credentials::new(
				consumer.key.expose(),
				consumer.secret,
				token.expose(),
				token_secret.clone(),
			))),
			_ => Ok(None),
		}
	}

	/// Returns `true` when every credential field is absent.
	pub fn is_empty(&self) -> bool {
		[
			&self.api_key,
			&self.api_key_secret,
			&self.access_token,
			&self.access_token_secret,
			&self.bearer_token,
		]
		.into_iter()
		.all(|field| present(field).is_none())
	}

	/// Returns `true` when the consumer and access pairs are all present.
	pub fn is_complete(&self) -> bool {
		[&self.api_key, &self.api_key_secret, &self.access_token, &self.access_token_secret]
			.into_iter()
			.all(|field| present(field).is_some())
	}
}

/// LinkedIn secret document: `{accessToken}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInKeys {
	/// Member access token obtained through the authorization code flow.
	pub access_token: Secret,
}
impl LinkedInKeys {
	/// Parses a stored secret, tolerating documents that were JSON-encoded twice.
	pub fn from_secret(raw: &Secret) -> Result<Self, ConfigError> {
		decode_document(Platform::LinkedIn, raw.expose())
	}

	/// Serializes the document for the secret store.
	pub fn to_secret(&self) -> Secret {
		Secret::new(encode_document(self))
	}
}

fn present(field: &Option<Secret>) -> Option<&Secret> {
	field.as_ref().filter(|secret| !secret.is_empty())
}

fn decode_document<T>(platform: Platform, raw: &str) -> Result<T, ConfigError>
where
	T: DeserializeOwned,
{
	let malformed = |source| ConfigError::MalformedCredentials { platform, source };
	let mut de = serde_json::Deserializer::from_str(raw);
	let value: Value = serde_path_to_error::deserialize(&mut de).map_err(malformed)?;
	let value = match value {
		Value::String(inner) => {
			let mut de = serde_json::Deserializer::from_str(&inner);

			serde_path_to_error::deserialize(&mut de).map_err(malformed)?
		},
		other => other,
	};

	serde_path_to_error::deserialize(value).map_err(malformed)
}

fn encode_document<T>(document: &T) -> String
where
	T: Serialize,
{
	// Documents only hold strings, so serialization cannot fail.
	serde_json::to_string(document).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn account() -> AccountId {
		AccountId::new("acme").expect("Account fixture should be valid.")
	}

	#[test]
	fn decodes_plain_and_double_encoded_documents() {
		let plain = Secret::new(r#"{"apiKey":"k","apiKeySecret":"s"}"#);
		let double = Secret::new(r#""{\"apiKey\":\"k\",\"apiKeySecret\":\"s\"}""#);
		let first = TwitterKeys::from_secret(&plain).expect("Plain document should decode.");
		let second = TwitterKeys::from_secret(&double).expect("Double encoding should decode.");

		assert_eq!(first, second);
		assert_eq!(first.api_key.as_ref().map(Secret::expose), Some("k"));
	}

	#[test]
	fn missing_consumer_pair_is_a_config_error() {
		let keys = TwitterKeys { api_key: Some("k".into()), ..Default::default() };
		let err = keys.oauth1(&account()).expect_err("Missing secret should fail.");

		assert!(matches!(err, ConfigError::MissingCredentials { platform: Platform::Twitter, .. }));

		let blank = TwitterKeys {
			api_key: Some("k".into()),
			api_key_secret: Some("".into()),
			..Default::default()
		};

		assert!(blank.consumer(&account()).is_err(), "Empty strings count as missing.");
	}

	#[test]
	fn access_pair_selects_oauth1() {
		let keys = TwitterKeys {
			api_key: Some("k".into()),
			api_key_secret: Some("s".into()),
			access_token: Some("t".into()),
			access_token_secret: Some("ts".into()),
			bearer_token: None,
		};
		let credentials = keys
			.oauth1(&account())
			.expect("Complete keys should resolve.")
			.expect("Access pair should select OAuth 1.0a.");

		assert_eq!(credentials.consumer_key, "k");
		assert!(keys.is_complete());

		let app_only = TwitterKeys { access_token_secret: None, ..keys };

		assert!(app_only.oauth1(&account()).expect("Consumer pair is present.").is_none());
		assert!(!app_only.is_complete());
	}

	#[test]
	fn linkedin_keys_round_trip() {
		let keys = LinkedInKeys { access_token: "li-token".into() };
		let stored = keys.to_secret();

		assert_eq!(stored.expose(), r#"{"accessToken":"li-token"}"#);
		assert_eq!(LinkedInKeys::from_secret(&stored).expect("Document should decode."), keys);
	}

	#[test]
	fn malformed_documents_are_reported() {
		let err = LinkedInKeys::from_secret(&Secret::new("{\"accessToken\": 5}"))
			.expect_err("Numeric token should fail.");

		assert!(matches!(
			err,
			ConfigError::MalformedCredentials { platform: Platform::LinkedIn, .. }
		));
	}
}

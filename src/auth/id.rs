//! Strongly typed identifiers enforced across the relay domain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $normalize:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation and normalization.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self($normalize(view)))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (account, post).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (account, post).
		kind: &'static str,
	},
	/// The identifier contains a character reserved by key and schedule naming.
	#[error("{kind} identifier contains the reserved character `{character}`.")]
	ReservedCharacter {
		/// Kind of identifier (account, post).
		kind: &'static str,
		/// Offending character.
		character: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (account, post).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { AccountId, "Lowercased identifier for a managed social account.", "Account", lowercase }
def_id! { PostId, "Identifier for a scheduled post record.", "Post", verbatim }

fn lowercase(view: &str) -> String {
	view.to_lowercase()
}

fn verbatim(view: &str) -> String {
	view.to_owned()
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	// `#`, `|`, and `/` delimit campaign keys, OAuth state, and secret paths.
	if let Some(character) = view.chars().find(|c| matches!(c, '#' | '|' | '/')) {
		return Err(IdentifierError::ReservedCharacter { kind, character });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn account_ids_are_lowercased() {
		let account = AccountId::new("ReadySetCloud").expect("Account fixture should be valid.");

		assert_eq!(account.as_ref(), "readysetcloud");
		assert_eq!(format!("{account:?}"), "Account(readysetcloud)");
		assert_eq!(account, AccountId::new("readysetcloud").expect("Lowercase should be valid."));
	}

	#[test]
	fn identifiers_reject_whitespace_and_reserved_characters() {
		assert!(AccountId::new(" acme").is_err(), "Leading whitespace must be rejected.");
		assert!(AccountId::new("").is_err());
		assert!(matches!(
			AccountId::new("acme|evil"),
			Err(IdentifierError::ReservedCharacter { character: '|', .. })
		));
		assert!(PostId::new("post#1").is_err());
		assert!(PostId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
		assert_eq!(PostId::new("Post-1").expect("Post id should be valid.").as_ref(), "Post-1");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let account: AccountId =
			serde_json::from_str("\"Acme\"").expect("Account should deserialize successfully.");

		assert_eq!(account.as_ref(), "acme");
		assert!(serde_json::from_str::<AccountId>("\"with space\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<AccountId, u8> = HashMap::from_iter([(
			AccountId::new("acme").expect("Account used for lookup should be valid."),
			7_u8,
		)]);

		assert_eq!(map.get("acme"), Some(&7));
	}
}

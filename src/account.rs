//! Account and scheduled-post records persisted in the key-value store.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, PostId},
};

/// Social platforms the relay can publish to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
	/// Twitter/X.
	#[serde(rename = "twitter")]
	Twitter,
	/// LinkedIn organization pages.
	#[serde(rename = "linkedIn")]
	LinkedIn,
	/// Discord channels.
	#[serde(rename = "discord")]
	Discord,
}
impl Platform {
	/// Returns the wire label used in requests and records.
	pub const fn as_str(self) -> &'static str {
		match self {
			Platform::Twitter => "twitter",
			Platform::LinkedIn => "linkedIn",
			Platform::Discord => "discord",
		}
	}

	/// Returns the human-readable platform name.
	pub const fn label(self) -> &'static str {
		match self {
			Platform::Twitter => "Twitter",
			Platform::LinkedIn => "LinkedIn",
			Platform::Discord => "Discord",
		}
	}

	/// Returns the lowercase segment used in secret paths.
	pub const fn secret_segment(self) -> &'static str {
		match self {
			Platform::Twitter => "twitter",
			Platform::LinkedIn => "linkedin",
			Platform::Discord => "discord",
		}
	}
}
impl Display for Platform {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Platform {
	type Err = crate::error::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"twitter" => Ok(Platform::Twitter),
			"linkedIn" => Ok(Platform::LinkedIn),
			"discord" => Ok(Platform::Discord),
			_ => Err(crate::error::Error::invalid_request(format!("unknown platform `{s}`"))),
		}
	}
}

/// Credential-driven status of a platform block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformStatus {
	/// No usable credentials are stored.
	#[default]
	Inactive,
	/// Credentials are stored and believed valid.
	Active,
	/// Stored credentials outlived their lifetime and were withdrawn.
	Expired,
}

/// Twitter/X configuration block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterProfile {
	/// Handle used to build status URLs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub handle: Option<String>,
	/// Credential status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<PlatformStatus>,
}
impl TwitterProfile {
	/// Returns `true` when credentials are active.
	pub fn is_active(&self) -> bool {
		self.status == Some(PlatformStatus::Active)
	}
}

/// LinkedIn configuration block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInProfile {
	/// Organization page that posts are authored as.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
	/// Credential status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<PlatformStatus>,
	/// Instant of the last status change.
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		with = "time::serde::rfc3339::option"
	)]
	pub status_timestamp: Option<OffsetDateTime>,
	/// Page type (for example `organization`).
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
}
impl LinkedInProfile {
	/// Returns `true` when credentials are active.
	pub fn is_active(&self) -> bool {
		self.status == Some(PlatformStatus::Active)
	}
}

/// Discord configuration block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordProfile {
	/// Default channel messages are delivered to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub channel: Option<String>,
}

/// A managed social account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	/// Immutable lowercase identifier.
	pub id: AccountId,
	/// Display name.
	pub name: String,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Twitter/X block.
	#[serde(default)]
	pub twitter: TwitterProfile,
	/// LinkedIn block.
	#[serde(default)]
	pub linked_in: LinkedInProfile,
	/// Discord block.
	#[serde(default)]
	pub discord: DiscordProfile,
}
impl Account {
	/// Creates an account with empty platform blocks.
	pub fn new(id: AccountId, name: impl Into<String>, created_at: OffsetDateTime) -> Self {
		Self {
			id,
			name: name.into(),
			created_at,
			twitter: TwitterProfile::default(),
			linked_in: LinkedInProfile::default(),
			discord: DiscordProfile::default(),
		}
	}
}

/// A post awaiting publication by an external scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
	/// Post identifier.
	pub id: PostId,
	/// Owning account.
	pub account: AccountId,
	/// Target platform.
	pub platform: Platform,
	/// Optional campaign label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub campaign: Option<String>,
	/// Publication instant.
	#[serde(with = "time::serde::rfc3339")]
	pub scheduled_for: OffsetDateTime,
	/// Message text.
	pub message: String,
}
impl ScheduledPost {
	/// Returns the `<account>#<campaign>` index key, when the post belongs to a campaign.
	pub fn campaign_key(&self) -> Option<String> {
		self.campaign.as_deref().map(|campaign| campaign_key(&self.account, campaign))
	}

	/// Returns the `<account>#<platform>#<id>` name of the post's publication schedule.
	pub fn schedule_name(&self) -> String {
		format!("{}#{}#{}", self.account, self.platform, self.id)
	}
}

/// Builds the `<account>#<campaign>` index key.
pub fn campaign_key(account: &AccountId, campaign: &str) -> String {
	format!("{account}#{campaign}")
}

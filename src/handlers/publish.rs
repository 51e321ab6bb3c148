//! Publishing operations for X and Discord plus the account list's test post.

// crates.io
use serde_json::json;
// self
use super::{ApiResponse, Relay, path_account_id, respond};
use crate::{
	_prelude::*,
	account::{Account, Platform},
	auth::AccountId,
	obs::{self, OperationKind},
	platforms::{
		self, MediaKind,
		discord::{self, Delivery},
		twitter,
	},
	store::SecretKey,
};

const INVALID_PLATFORM: &str = "Invalid platform selection";
const UNABLE_TO_SEND: &str = "Unable to send post on selected platform";
const DISCORD_NOT_CONFIGURED: &str = "Discord is not configured properly for this account";

/// Body of `send_test_post`.
#[derive(Clone, Debug, Deserialize)]
pub struct TestPost {
	/// Platform wire label (`twitter`, `linkedIn`, `discord`).
	pub platform: String,
	/// Message text.
	pub message: String,
}

/// Input of `send_x_post`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XPostRequest {
	/// Posting account.
	pub account_id: AccountId,
	/// Tweet text.
	pub message: String,
	/// Media previously uploaded with `upload_media_to_x`.
	#[serde(default)]
	pub media_ids: Vec<String>,
}

/// Result of `send_x_post`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct XPostResult {
	/// Tweet id.
	pub id: String,
}

/// Input of `upload_media_to_x`; exactly one source is expected, `image` wins when both are set.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadRequest {
	/// Uploading account.
	pub account_id: AccountId,
	/// Public URL of a PNG image.
	#[serde(default)]
	pub image: Option<Url>,
	/// Public URL of an MP4 video.
	#[serde(default)]
	pub video: Option<Url>,
}
impl MediaUploadRequest {
	fn source(&self) -> Option<(&Url, MediaKind)> {
		match (&self.image, &self.video) {
			(Some(image), _) => Some((image, MediaKind::Image)),
			(None, Some(video)) => Some((video, MediaKind::Video)),
			(None, None) => None,
		}
	}
}

/// Result of `upload_media_to_x`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResult {
	/// X media id.
	pub media_id: String,
}

/// Input of `send_discord_message`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordMessageRequest {
	/// Sending account.
	pub account_id: AccountId,
	/// Message text.
	pub message: String,
	/// Optional channel override and attachment.
	#[serde(default)]
	pub metadata: Option<DiscordMetadata>,
}

/// Per-message Discord options.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscordMetadata {
	/// Channel overriding the account default.
	#[serde(default)]
	pub channel: Option<String>,
	/// Public URL of an MP4 attached as `clip.mp4`.
	#[serde(default)]
	pub video: Option<Url>,
}

/// Result of `send_discord_message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DiscordMessageResult {
	/// Message delivered.
	Sent {
		/// Message id.
		id: String,
	},
	/// The channel could not be found.
	Failed {
		/// Always `false`.
		success: bool,
	},
}

impl Relay {
	/// Posts a message to one platform on behalf of an account and reports where it landed.
	pub async fn send_test_post(&self, id: &str, post: TestPost) -> ApiResponse {
		respond(OperationKind::SendTestPost, "send_test_post", async {
			let Some(id) = path_account_id(id) else {
				return Ok(ApiResponse::not_found());
			};
			let account = self.require_account(&id).await?;
			let Ok(platform) = post.platform.parse::<Platform>() else {
				return Ok(ApiResponse::message(400, INVALID_PLATFORM));
			};

			match platform {
				Platform::Twitter => match account.twitter.handle.as_deref() {
					Some(handle) if account.twitter.is_active() => {
						let tweet = self.publish_tweet(&id, &post.message, &[]).await?;
						let url = format!("https://x.com/{handle}/status/{tweet}");

						Ok(ApiResponse::json(201, &json!({ "url": url })))
					},
					_ => Ok(ApiResponse::message(409, UNABLE_TO_SEND)),
				},
				Platform::LinkedIn if account.linked_in.is_active() => {
					let urn = self.publish_linkedin(&account, &post.message).await?;
					let url = format!("https://linkedin.com/posts/{urn}");

					Ok(ApiResponse::json(201, &json!({ "url": url })))
				},
				Platform::LinkedIn => Ok(ApiResponse::message(409, UNABLE_TO_SEND)),
				Platform::Discord => {
					let delivery = self.deliver_discord(&account, None, &post.message, None).await?;
					let message = match delivery {
						Some(Delivery::Sent { id }) => format!("Message sent to channel: {id}"),
						Some(Delivery::ChannelMissing) | None => DISCORD_NOT_CONFIGURED.to_owned(),
					};

					Ok(ApiResponse::message(201, message))
				},
			}
		})
		.await
	}

	/// Publishes a tweet, OAuth 1.0a signed when the access pair is stored.
	pub async fn send_x_post(&self, request: XPostRequest) -> Result<XPostResult> {
		obs::observe(OperationKind::SendXPost, "send_x_post", async {
			let XPostRequest { account_id, message, media_ids } = &request;
			let id = self.publish_tweet(account_id, message, media_ids).await?;

			Ok(XPostResult { id })
		})
		.await
	}

	/// Downloads media and uploads it to X, reusing ids of sources the account uploaded before.
	pub async fn upload_media_to_x(
		&self,
		request: MediaUploadRequest,
	) -> Result<MediaUploadResult> {
		obs::observe(OperationKind::UploadMediaToX, "upload_media_to_x", async {
			let (source, kind) = request
				.source()
				.ok_or_else(|| Error::invalid_request("either `image` or `video` is required"))?;

			let account = &request.account_id;
			let auth = self.twitter_auth(account).await?;

			if let Some(media_id) = self.cache.media_id(account, source.as_str()) {
				tracing::debug!(%account, source = %source, "Reusing uploaded media.");

				return Ok(MediaUploadResult { media_id });
			}

			let bytes = platforms::fetch_media(&self.http_client, source).await?;
			let result = twitter::upload_media(
				&self.http_client,
				&self.endpoints.twitter_media_upload,
				&auth,
				bytes,
				kind,
			)
			.await;
			let media_id = self.evict_on_unauthorized(account, result)?;

			self.cache.store_media_id(account, source.as_str(), media_id.clone());

			Ok(MediaUploadResult { media_id })
		})
		.await
	}

	/// Sends a Discord message to the metadata channel or the account default.
	pub async fn send_discord_message(
		&self,
		request: DiscordMessageRequest,
	) -> Result<DiscordMessageResult> {
		obs::observe(OperationKind::SendDiscordMessage, "send_discord_message", async {
			let account = self.require_account(&request.account_id).await?;
			let metadata = request.metadata.unwrap_or_default();
			let attachment = match &metadata.video {
				Some(video) => Some(platforms::fetch_media(&self.http_client, video).await?),
				None => None,
			};
			let channel = metadata.channel.filter(|channel| !channel.is_empty());
			let delivery = self
				.deliver_discord(&account, channel.as_deref(), &request.message, attachment)
				.await?
				.ok_or_else(|| Error::PlatformNotConfigured {
					account: account.id.clone(),
					platform: Platform::Discord,
				})?;

			Ok(match delivery {
				Delivery::Sent { id } => DiscordMessageResult::Sent { id },
				Delivery::ChannelMissing => DiscordMessageResult::Failed { success: false },
			})
		})
		.await
	}

	async fn publish_tweet(
		&self,
		account: &AccountId,
		text: &str,
		media_ids: &[String],
	) -> Result<String> {
		let auth = self.twitter_auth(account).await?;
		let result = twitter::post_tweet(
			&self.http_client,
			&self.endpoints.twitter_tweets,
			&auth,
			text,
			media_ids,
		)
		.await;

		self.evict_on_unauthorized(account, result)
	}

	/// Returns `None` when neither an override nor the account default names a channel.
	async fn deliver_discord(
		&self,
		account: &Account,
		channel: Option<&str>,
		text: &str,
		attachment: Option<Vec<u8>>,
	) -> Result<Option<Delivery>> {
		let default = account.discord.channel.as_deref().filter(|channel| !channel.is_empty());
		let Some(channel) = channel.or(default) else {
			return Ok(None);
		};
		let token = self.shared_secret(SecretKey::DISCORD_BOT_TOKEN).await?;
		let delivery = discord::send_message(
			&self.http_client,
			&self.endpoints.discord_api,
			&token,
			channel,
			text,
			attachment,
		)
		.await?;

		Ok(Some(delivery))
	}
}

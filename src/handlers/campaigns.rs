//! Campaign cleanup.

// self
use super::Relay;
use crate::{
	_prelude::*,
	account::campaign_key,
	auth::AccountId,
	obs::{self, OperationKind},
	scheduler::SOCIAL_GROUP,
};

/// Input of `delete_social_campaign`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRef {
	/// Owning account.
	pub account_id: AccountId,
	/// Campaign label.
	pub campaign: String,
}

impl Relay {
	/// Deletes every post of a campaign along with its publication timer.
	///
	/// Timer removal failures are logged; the returned count covers deleted posts.
	pub async fn delete_social_campaign(&self, campaign: CampaignRef) -> Result<usize> {
		obs::observe(OperationKind::DeleteSocialCampaign, "delete_social_campaign", async {
			let key = campaign_key(&campaign.account_id, &campaign.campaign);
			let posts = self.posts.posts_for_campaign(&key).await?;
			let mut deleted = 0;

			for post in posts {
				if self.posts.delete_post(&post.id).await?.is_some() {
					deleted += 1;
				}

				self.remove_schedule(SOCIAL_GROUP, &post.schedule_name()).await;
			}

			tracing::info!(campaign = %key, deleted, "Campaign deleted.");

			Ok(deleted)
		})
		.await
	}
}

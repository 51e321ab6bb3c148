//! Model-assisted publication time selection.

// self
use super::Relay;
use crate::{
	_prelude::*,
	obs::{self, OperationKind},
	planner::{self, MessagesModel, ScheduleRequest, ScheduledTime, SchedulingModel},
	store::SecretKey,
};

impl Relay {
	/// Asks the scheduling model for the next publication time of a post.
	///
	/// Without a model attached through [`Relay::with_model`], the configured messages endpoint
	/// is called with the shared model API key.
	pub async fn calculate_scheduled_time(
		&self,
		request: ScheduleRequest,
	) -> Result<ScheduledTime> {
		obs::observe(OperationKind::CalculateScheduledTime, "calculate_scheduled_time", async {
			let prompt = planner::prompt_for(&request);
			let answer = match &self.model {
				Some(model) => model.complete(&prompt).await?,
				None => {
					let api_key = self.shared_secret(SecretKey::MODEL_API_KEY).await?;
					let model = MessagesModel::new(
						self.http_client.clone(),
						self.endpoints.model_messages.clone(),
						api_key,
					);

					model.complete(&prompt).await?
				},
			};
			let date = planner::extract_date_time(&answer)?;

			tracing::debug!(%date, "Scheduled time selected.");

			Ok(ScheduledTime { date })
		})
		.await
	}
}

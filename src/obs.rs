//! Observability helpers for relay operations.
//!
//! - Every operation runs inside a `tracing` span named `social_relay.operation` carrying the
//!   `operation` and `stage` fields.
//! - Enable `metrics` to increment the `social_relay_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Account creation.
	AddAccount,
	/// Partial account update.
	UpdateAccount,
	/// Account removal.
	DeleteAccount,
	/// Account configuration form rendering.
	AccountConfigPage,
	/// Account list page rendering.
	AccountsPage,
	/// LinkedIn authorization URL construction.
	AuthenticateLinkedIn,
	/// LinkedIn authorization code capture.
	CaptureLinkedInToken,
	/// Ad-hoc test post.
	SendTestPost,
	/// Tweet publication.
	SendXPost,
	/// X media upload.
	UploadMediaToX,
	/// X app-only bearer token exchange.
	BearerExchange,
	/// Discord message delivery.
	SendDiscordMessage,
	/// LinkedIn post publication.
	SendLinkedInPost,
	/// LinkedIn credential expiry.
	ExpireLinkedInCredentials,
	/// Campaign cleanup.
	DeleteSocialCampaign,
	/// Model-assisted schedule selection.
	CalculateScheduledTime,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::AddAccount => "add_account",
			OperationKind::UpdateAccount => "update_account",
			OperationKind::DeleteAccount => "delete_account",
			OperationKind::AccountConfigPage => "account_config_page",
			OperationKind::AccountsPage => "accounts_page",
			OperationKind::AuthenticateLinkedIn => "authenticate_linkedin",
			OperationKind::CaptureLinkedInToken => "capture_linkedin_token",
			OperationKind::SendTestPost => "send_test_post",
			OperationKind::SendXPost => "send_x_post",
			OperationKind::UploadMediaToX => "upload_media_to_x",
			OperationKind::BearerExchange => "bearer_exchange",
			OperationKind::SendDiscordMessage => "send_discord_message",
			OperationKind::SendLinkedInPost => "send_linkedin_post",
			OperationKind::ExpireLinkedInCredentials => "expire_linkedin_credentials",
			OperationKind::DeleteSocialCampaign => "delete_social_campaign",
			OperationKind::CalculateScheduledTime => "calculate_scheduled_time",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span, recording attempt and outcome.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(e) => {
			::tracing::warn!(operation = kind.as_str(), stage, error = %e, "Operation failed.");

			record_operation_outcome(kind, OperationOutcome::Failure);
		},
	}

	result
}

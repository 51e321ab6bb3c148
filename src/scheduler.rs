//! One-shot timer contract backed by an external scheduler service.
//!
//! The relay never fires timers itself. It registers [`Schedule`]s by group and name, and the
//! hosting runtime invokes the matching operation (for example
//! [`Relay::expire_linkedin_credentials`](crate::handlers::Relay::expire_linkedin_credentials))
//! when a timer elapses.

// crates.io
use serde_json::Value;
use time::macros::format_description;
// self
use crate::_prelude::*;

/// Group holding credential-expiry timers.
pub const TOKEN_EXPIRATION_GROUP: &str = "token-expiration";
/// Group holding post publication timers.
pub const SOCIAL_GROUP: &str = "social";

/// Boxed future returned by every scheduler operation.
pub type SchedulerFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, SchedulerError>> + 'a + Send>>;

/// Contract for registering and removing one-shot timers.
pub trait Scheduler
where
	Self: Send + Sync,
{
	/// Creates the schedule, or replaces the one registered under the same group and name.
	fn upsert(&self, schedule: Schedule) -> SchedulerFuture<'_, ()>;

	/// Deletes a schedule; fails with [`SchedulerError::NotFound`] when nothing matched.
	fn delete<'a>(&'a self, group: &'a str, name: &'a str) -> SchedulerFuture<'a, ()>;

	/// Fetches a schedule, if present.
	fn get<'a>(&'a self, group: &'a str, name: &'a str) -> SchedulerFuture<'a, Option<Schedule>>;
}

/// A one-shot timer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
	/// Name, unique within the group.
	pub name: String,
	/// Group name.
	pub group: String,
	/// Instant the timer fires.
	#[serde(with = "time::serde::rfc3339")]
	pub fire_at: OffsetDateTime,
	/// JSON payload delivered to the target operation.
	pub payload: Value,
}
impl Schedule {
	/// Creates a schedule.
	pub fn new(
		group: impl Into<String>,
		name: impl Into<String>,
		fire_at: OffsetDateTime,
		payload: Value,
	) -> Self {
		Self { name: name.into(), group: group.into(), fire_at, payload }
	}

	/// Renders the `at(YYYY-MM-DDTHH:MM:SS)` expression in UTC, truncated to whole seconds.
	pub fn expression(&self) -> String {
		let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
		let utc = self.fire_at.to_offset(time::UtcOffset::UTC);

		match utc.format(&format) {
			Ok(rendered) => format!("at({rendered})"),
			// Only years outside 0..=9999 fail to render.
			Err(_) => format!("at({})", utc.unix_timestamp()),
		}
	}
}

/// Error type produced by scheduler implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SchedulerError {
	/// No schedule matched the group and name.
	#[error("Schedule `{group}/{name}` was not found.")]
	NotFound {
		/// Group name.
		group: String,
		/// Schedule name.
		name: String,
	},
	/// Backend-level failure for the scheduler service.
	#[error("Scheduler failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// In-process scheduler that records timers for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryScheduler(Arc<RwLock<BTreeMap<(String, String), Schedule>>>);
impl MemoryScheduler {
	/// Returns every registered schedule in a group ordered by name.
	pub fn schedules_in(&self, group: &str) -> Vec<Schedule> {
		self.0.read().values().filter(|schedule| schedule.group == group).cloned().collect()
	}
}
impl Scheduler for MemoryScheduler {
	fn upsert(&self, schedule: Schedule) -> SchedulerFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().insert((schedule.group.clone(), schedule.name.clone()), schedule);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, group: &'a str, name: &'a str) -> SchedulerFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().remove(&(group.to_owned(), name.to_owned())).map(|_| ()).ok_or_else(
				|| SchedulerError::NotFound { group: group.to_owned(), name: name.to_owned() },
			)
		})
	}

	fn get<'a>(&'a self, group: &'a str, name: &'a str) -> SchedulerFuture<'a, Option<Schedule>> {
		let key = (group.to_owned(), name.to_owned());

		Box::pin(async move { Ok(self.0.read().get(&key).cloned()) })
	}
}

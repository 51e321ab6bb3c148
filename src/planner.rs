//! Model-assisted selection of the next publication slot.
//!
//! The planner turns an existing schedule into a prompt, asks a [`SchedulingModel`] for a slot,
//! and extracts the `<date_time>` answer. Rules enforced by the prompt: at least one day after the
//! request timestamp, weekdays only, one post per day per platform, the next free day, varied
//! engagement times, correct year rollover, and optional campaign spacing.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
use serde_json::json;
use time::{
	PrimitiveDateTime, format_description::well_known::Rfc3339, macros::format_description,
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::TransientError,
	http::{self, ReqwestHttpClient},
};

/// Default model identifier used by [`MessagesModel`].
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
/// Default completion budget used by [`MessagesModel`].
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Minimum spacing between posts of one campaign, in days.
pub const CAMPAIGN_SPACING_DAYS: u32 = 5;

const MESSAGES: &str = "model.messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

static DATE_TIME: LazyLock<Result<Regex, regex::Error>> =
	LazyLock::new(|| Regex::new(r"<date_time>(.*?)</date_time>"));

/// Boxed future returned by [`SchedulingModel`].
pub type ModelFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Language model that answers scheduling prompts.
pub trait SchedulingModel
where
	Self: Send + Sync,
{
	/// Returns the model's text answer to `prompt`.
	fn complete<'a>(&'a self, prompt: &'a str) -> ModelFuture<'a, String>;
}

/// One already-scheduled post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
	/// Publication instant as stored (`YYYY-MM-DDTHH:MM:SS`, optionally with an offset).
	pub sort: String,
	/// Platform label.
	#[serde(rename = "type")]
	pub platform: String,
	/// Campaign label, when the post belongs to one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub campaign: Option<String>,
}

/// Post awaiting a slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
	/// Campaign label, when the post belongs to one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub campaign: Option<String>,
}

/// Input of [`Relay::calculate_scheduled_time`](crate::handlers::Relay::calculate_scheduled_time).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
	/// Post to place.
	pub post: PostDraft,
	/// Existing schedule.
	#[serde(default)]
	pub schedule: Vec<ScheduleEntry>,
	/// Reference timestamp the slot must follow.
	pub timestamp: String,
}

/// Selected slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTime {
	/// `YYYY-MM-DDTHH:MM:SS` as answered by the model.
	pub date: String,
}

/// Returns the latest `sort` among entries of `campaign` (case-insensitive).
///
/// Entries whose `sort` cannot be parsed never displace an earlier pick.
pub fn latest_campaign_date(campaign: &str, schedule: &[ScheduleEntry]) -> Option<String> {
	let campaign = campaign.to_lowercase();
	let mut matching = schedule.iter().filter(|entry| {
		entry.campaign.as_deref().is_some_and(|label| label.to_lowercase() == campaign)
	});
	let first = matching.next()?;
	let latest = matching.fold(first, |latest, current| {
		match (parse_sort(&current.sort), parse_sort(&latest.sort)) {
			(Some(current_at), Some(latest_at)) if current_at > latest_at => current,
			_ => latest,
		}
	});

	Some(latest.sort.clone())
}

/// Renders the rule list for a request made at `timestamp`.
pub fn build_rules(timestamp: &str, last_campaign_date: Option<&str>) -> String {
	let mut rules = vec![
		format!("- The post must be at least one day after {timestamp}"),
		"- Do not schedule a post on the weekend.".to_owned(),
		"- Only one post is allowed to be scheduled a day per platform".to_owned(),
		"- Select the next available day in the future that matches the above rules unless \
		 otherwise specified"
			.to_owned(),
		"- The scheduled time of day must vary between high engagement times in the morning and \
		 afternoon for the target audience."
			.to_owned(),
		"- Make sure the year is correct. If scheduling into January from December, make sure to \
		 increment the year."
			.to_owned(),
	];

	if let Some(date) = last_campaign_date {
		rules.push(format!(
			"- The date must be at least {CAMPAIGN_SPACING_DAYS} days after {date}"
		));
	}

	rules.join("\n")
}

/// Renders schedule lines (`\t- <sort>, Platform: <type>`) joined by CRLF, or `No schedule`.
pub fn schedule_lines(schedule: &[ScheduleEntry]) -> String {
	if schedule.is_empty() {
		return "No schedule".to_owned();
	}

	schedule
		.iter()
		.map(|entry| format!("\t- {}, Platform: {}", entry.sort, entry.platform))
		.collect::<Vec<_>>()
		.join("\r\n")
}

/// Renders the full scheduling prompt.
pub fn build_prompt(rules: &str, schedule: &str) -> String {
	format!(
		"You are an AI scheduling assistant that helps determine the optimal date and time to send \
		 out social media posts. To do this, you will be provided with a set of scheduling rules to \
		 follow and an existing schedule of social media posts. Your task is to analyze this \
		 information and select the best date and time for the next social media post.\n\n\
		 Here are the scheduling rules you must adhere to:\n<rules>\n{rules}\n</rules>\n\n\
		 Here is the current scheduled dates of social media posts:\n<schedule>\n{schedule}\n\
		 </schedule>\n\n\
		 First, carefully review the provided rules and schedule. Think through potential date and \
		 time options, taking into account all constraints. Write out your thought process in a \
		 <scratchpad> section.\n\n\
		 After considering all factors, select the optimal date and time for the next social media \
		 post that follows all the rules and fits well into the existing schedule. Provide your \
		 selected date and time in YYYY-MM-DDTHH:MM:SS format inside <date_time> tags."
	)
}

/// Builds the prompt for a request.
pub fn prompt_for(request: &ScheduleRequest) -> String {
	let last_campaign_date = request
		.post
		.campaign
		.as_deref()
		.and_then(|campaign| latest_campaign_date(campaign, &request.schedule));
	let rules = build_rules(&request.timestamp, last_campaign_date.as_deref());

	build_prompt(&rules, &schedule_lines(&request.schedule))
}

/// Extracts the non-empty content of the first `<date_time>` tag.
pub fn extract_date_time(text: &str) -> Result<String> {
	let pattern = DATE_TIME.as_ref().map_err(|e| TransientError::UnexpectedResponse {
		endpoint: MESSAGES,
		message: e.to_string(),
	})?;

	pattern
		.captures(text)
		.and_then(|captures| captures.get(1))
		.map(|date| date.as_str().trim())
		.filter(|date| !date.is_empty())
		.map(ToOwned::to_owned)
		.ok_or_else(|| {
			tracing::warn!(answer = text, "Model answer lacked a date_time tag.");

			TransientError::UnexpectedResponse {
				endpoint: MESSAGES,
				message: "Did not receive expected response".into(),
			}
			.into()
		})
}

/// [`SchedulingModel`] backed by an Anthropic-style messages endpoint.
#[derive(Clone, Debug)]
pub struct MessagesModel {
	http: ReqwestHttpClient,
	endpoint: Url,
	api_key: Secret,
	model: String,
	max_tokens: u32,
}
impl MessagesModel {
	/// Creates a model client using [`DEFAULT_MODEL`] and [`DEFAULT_MAX_TOKENS`].
	pub fn new(http: ReqwestHttpClient, endpoint: Url, api_key: Secret) -> Self {
		Self {
			http,
			endpoint,
			api_key,
			model: DEFAULT_MODEL.to_owned(),
			max_tokens: DEFAULT_MAX_TOKENS,
		}
	}

	/// Overrides the model identifier.
	pub fn with_model(mut self, model: impl Into<String>) -> Self {
		self.model = model.into();

		self
	}

	/// Overrides the completion budget.
	pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
		self.max_tokens = max_tokens;

		self
	}
}
impl SchedulingModel for MessagesModel {
	fn complete<'a>(&'a self, prompt: &'a str) -> ModelFuture<'a, String> {
		Box::pin(async move {
			let body = json!({
				"model": self.model,
				"max_tokens": self.max_tokens,
				"messages": [{
					"role": "user",
					"content": [{ "type": "text", "text": prompt }],
				}],
			});
			let request = self
				.http
				.post(self.endpoint.clone())
				.header("x-api-key", self.api_key.expose())
				.header("anthropic-version", ANTHROPIC_VERSION)
				.json(&body);
			let response = http::send(MESSAGES, request).await?;
			let answer: MessagesResponse = http::decode_json(MESSAGES, response).await?;

			answer.content.into_iter().find_map(|block| block.text).ok_or_else(|| {
				TransientError::UnexpectedResponse {
					endpoint: MESSAGES,
					message: "answer carried no text block".into(),
				}
				.into()
			})
		})
	}
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
	content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
	#[serde(default)]
	text: Option<String>,
}

fn parse_sort(sort: &str) -> Option<OffsetDateTime> {
	let local = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

	OffsetDateTime::parse(sort, &Rfc3339)
		.ok()
		.or_else(|| PrimitiveDateTime::parse(sort, &local).ok().map(PrimitiveDateTime::assume_utc))
}

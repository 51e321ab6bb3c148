//! Upstream endpoint configuration.

// self
use crate::_prelude::*;

const TWITTER_TWEETS: &str = "https://api.twitter.com/2/tweets";
const TWITTER_MEDIA_UPLOAD: &str = "https://upload.twitter.com/1.1/media/upload.json";
const TWITTER_TOKEN: &str = "https://api.twitter.com/oauth2/token";
const LINKEDIN_AUTHORIZATION: &str = "https://www.linkedin.com/oauth/v2/authorization";
const LINKEDIN_TOKEN: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const LINKEDIN_POSTS: &str = "https://api.linkedin.com/rest/posts";
const DISCORD_API: &str = "https://discord.com/api/v10/";
const MODEL_MESSAGES: &str = "https://api.anthropic.com/v1/messages";
/// Default value of the `LinkedIn-Version` header.
pub const DEFAULT_LINKEDIN_VERSION: &str = "202405";

/// Errors raised while assembling [`Endpoints`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EndpointsError {
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A built-in default could not be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidUrl {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Every upstream URL the relay calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
	/// X API v2 tweet creation.
	pub twitter_tweets: Url,
	/// X API v1.1 media upload.
	pub twitter_media_upload: Url,
	/// X app-only bearer token exchange.
	pub twitter_token: Url,
	/// LinkedIn OAuth authorization page.
	pub linkedin_authorization: Url,
	/// LinkedIn OAuth token exchange.
	pub linkedin_token: Url,
	/// LinkedIn posts API.
	pub linkedin_posts: Url,
	/// Discord REST API base; always ends with `/`.
	pub discord_api: Url,
	/// Messages endpoint of the scheduling model.
	pub model_messages: Url,
	/// `LinkedIn-Version` header sent with posts.
	pub linkedin_version: String,
}
impl Endpoints {
	/// Returns a builder seeded with production defaults.
	pub fn builder() -> EndpointsBuilder {
		EndpointsBuilder::default()
	}

	/// Returns the production endpoints.
	pub fn production() -> Result<Self, EndpointsError> {
		Self::builder().build()
	}

	fn validate(&self) -> Result<(), EndpointsError> {
		[
			("twitter_tweets", &self.twitter_tweets),
			("twitter_media_upload", &self.twitter_media_upload),
			("twitter_token", &self.twitter_token),
			("linkedin_authorization", &self.linkedin_authorization),
			("linkedin_token", &self.linkedin_token),
			("linkedin_posts", &self.linkedin_posts),
			("discord_api", &self.discord_api),
			("model_messages", &self.model_messages),
		]
		.into_iter()
		.try_for_each(|(name, url)| validate_endpoint(name, url))
	}
}

/// Builder for [`Endpoints`]; unset fields fall back to production defaults.
#[derive(Clone, Debug, Default)]
pub struct EndpointsBuilder {
	twitter_tweets: Option<Url>,
	twitter_media_upload: Option<Url>,
	twitter_token: Option<Url>,
	linkedin_authorization: Option<Url>,
	linkedin_token: Option<Url>,
	linkedin_posts: Option<Url>,
	discord_api: Option<Url>,
	model_messages: Option<Url>,
	linkedin_version: Option<String>,
}
impl EndpointsBuilder {
	/// Overrides the tweet creation endpoint.
	pub fn twitter_tweets(mut self, url: Url) -> Self {
		self.twitter_tweets = Some(url);

		self
	}

	/// Overrides the media upload endpoint.
	pub fn twitter_media_upload(mut self, url: Url) -> Self {
		self.twitter_media_upload = Some(url);

		self
	}

	/// Overrides the bearer token endpoint.
	pub fn twitter_token(mut self, url: Url) -> Self {
		self.twitter_token = Some(url);

		self
	}

	/// Overrides the LinkedIn authorization page.
	pub fn linkedin_authorization(mut self, url: Url) -> Self {
		self.linkedin_authorization = Some(url);

		self
	}

	/// Overrides the LinkedIn token endpoint.
	pub fn linkedin_token(mut self, url: Url) -> Self {
		self.linkedin_token = Some(url);

		self
	}

	/// Overrides the LinkedIn posts endpoint.
	pub fn linkedin_posts(mut self, url: Url) -> Self {
		self.linkedin_posts = Some(url);

		self
	}

	/// Overrides the Discord REST API base.
	pub fn discord_api(mut self, url: Url) -> Self {
		self.discord_api = Some(url);

		self
	}

	/// Overrides the scheduling model endpoint.
	pub fn model_messages(mut self, url: Url) -> Self {
		self.model_messages = Some(url);

		self
	}

	/// Overrides the `LinkedIn-Version` header.
	pub fn linkedin_version(mut self, version: impl Into<String>) -> Self {
		self.linkedin_version = Some(version.into());

		self
	}

	/// Consumes the builder and validates the resulting endpoints.
	pub fn build(self) -> Result<Endpoints, EndpointsError> {
		let mut discord_api = or_default("discord_api", self.discord_api, DISCORD_API)?;

		if !discord_api.path().ends_with('/') {
			let path = format!("{}/", discord_api.path());

			discord_api.set_path(&path);
		}

		let endpoints = Endpoints {
			twitter_tweets: or_default("twitter_tweets", self.twitter_tweets, TWITTER_TWEETS)?,
			twitter_media_upload: or_default(
				"twitter_media_upload",
				self.twitter_media_upload,
				TWITTER_MEDIA_UPLOAD,
			)?,
			twitter_token: or_default("twitter_token", self.twitter_token, TWITTER_TOKEN)?,
			linkedin_authorization: or_default(
				"linkedin_authorization",
				self.linkedin_authorization,
				LINKEDIN_AUTHORIZATION,
			)?,
			linkedin_token: or_default("linkedin_token", self.linkedin_token, LINKEDIN_TOKEN)?,
			linkedin_posts: or_default("linkedin_posts", self.linkedin_posts, LINKEDIN_POSTS)?,
			discord_api,
			model_messages: or_default("model_messages", self.model_messages, MODEL_MESSAGES)?,
			linkedin_version: self
				.linkedin_version
				.unwrap_or_else(|| DEFAULT_LINKEDIN_VERSION.to_owned()),
		};

		endpoints.validate()?;

		Ok(endpoints)
	}
}

fn or_default(
	endpoint: &'static str,
	value: Option<Url>,
	default: &str,
) -> Result<Url, EndpointsError> {
	match value {
		Some(url) => Ok(url),
		None =>
			Url::parse(default).map_err(|source| EndpointsError::InvalidUrl { endpoint, source }),
	}
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), EndpointsError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(EndpointsError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Endpoint fixture should parse.")
	}

	#[test]
	fn production_defaults_validate() {
		let endpoints = Endpoints::production().expect("Production endpoints should validate.");

		assert_eq!(endpoints.twitter_tweets.as_str(), TWITTER_TWEETS);
		assert_eq!(endpoints.twitter_token.as_str(), TWITTER_TOKEN);
		assert_eq!(endpoints.linkedin_version, DEFAULT_LINKEDIN_VERSION);
	}

	#[test]
	fn rejects_plain_http_outside_loopback() {
		let err = Endpoints::builder()
			.twitter_tweets(url("http://api.example.com/2/tweets"))
			.build()
			.expect_err("Remote plain HTTP endpoints should be rejected.");

		assert!(matches!(err, EndpointsError::InsecureEndpoint { endpoint: "twitter_tweets", .. }));

		Endpoints::builder()
			.twitter_tweets(url("http://127.0.0.1:8080/2/tweets"))
			.linkedin_posts(url("http://localhost:8080/rest/posts"))
			.build()
			.expect("Loopback endpoints may use plain HTTP.");
	}

	#[test]
	fn discord_base_gains_trailing_slash() {
		let endpoints = Endpoints::builder()
			.discord_api(url("https://discord.example.com/api/v10"))
			.build()
			.expect("Endpoints should validate.");

		assert_eq!(endpoints.discord_api.as_str(), "https://discord.example.com/api/v10/");
		assert_eq!(
			endpoints
				.discord_api
				.join("channels/42/messages")
				.expect("Channel path should join.")
				.as_str(),
			"https://discord.example.com/api/v10/channels/42/messages"
		);
	}
}

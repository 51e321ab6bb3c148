//! Upstream clients for X, LinkedIn, and Discord.
//!
//! Each function performs exactly one logical upstream call (chunked video uploads aside) and
//! leaves cache and store bookkeeping to the caller.

pub mod discord;
pub mod linkedin;
pub mod twitter;

// self
use crate::{
	_prelude::*,
	http::{self, ReqwestHttpClient},
};

/// Kind of media attached to a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
	/// PNG image.
	Image,
	/// MP4 video.
	Video,
}
impl MediaKind {
	/// Returns the MIME type sent with the upload.
	pub const fn mime_type(self) -> &'static str {
		match self {
			MediaKind::Image => "image/png",
			MediaKind::Video => "video/mp4",
		}
	}

	/// Returns the file name attached to multipart uploads.
	pub const fn file_name(self) -> &'static str {
		match self {
			MediaKind::Image => "image.png",
			MediaKind::Video => "clip.mp4",
		}
	}
}

/// Downloads media bytes from a public URL.
pub async fn fetch_media(http: &ReqwestHttpClient, source: &Url) -> Result<Vec<u8>> {
	let response = http::send("media.download", http.get(source.clone())).await?;
	let bytes = response.bytes().await?;

	tracing::debug!(source = %source, len = bytes.len(), "Downloaded media.");

	Ok(bytes.to_vec())
}

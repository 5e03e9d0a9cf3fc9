//! Playlist loading and URI resolution.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use crate::fetch::SegmentFetcher;
use crate::playlist::{MediaPlaylist, Playlist};
use crate::{LoaderError, ParseError};

/// Fetches and parses playlists relative to a base URL.
pub struct PlaylistLoader {
	fetcher: Arc<dyn SegmentFetcher>,
	base: Url,

	/// Whether the server advertised `Accept-Ranges: bytes` on the last load.
	supports_ranges: bool,
}

impl PlaylistLoader {
	pub fn new(base: Url, fetcher: Arc<dyn SegmentFetcher>) -> Self {
		Self {
			fetcher,
			base,
			supports_ranges: false,
		}
	}

	/// Load the base URL, parsing as a master playlist first.
	///
	/// A media-only tag in the body aborts the master parse; the same
	/// document is then re-parsed as a media playlist.
	pub async fn load(&mut self) -> Result<Playlist, LoaderError> {
		let document = self
			.fetcher
			.fetch_document(&self.base)
			.await
			.map_err(|err| LoaderError::Network(err.to_string()))?;
		self.supports_ranges = document.accepts_ranges;

		match crate::playlist::MasterPlaylist::parse(&document.body) {
			Ok(master) => {
				info!(streams = master.streams.len(), url = %self.base, "loaded master playlist");
				Ok(Playlist::Master(master))
			}
			Err(ParseError::MediaInsteadOfMaster) => {
				debug!(url = %self.base, "master parse hit media tags, retrying as media");
				let media = MediaPlaylist::parse(&document.body)?;
				Ok(Playlist::Media(media))
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Load a media playlist by URI, resolved against the base URL.
	pub async fn load_media(&mut self, uri: &str) -> Result<MediaPlaylist, LoaderError> {
		let url = self.resolve(uri)?;

		let document = self
			.fetcher
			.fetch_document(&url)
			.await
			.map_err(|err| LoaderError::Network(err.to_string()))?;
		self.supports_ranges = document.accepts_ranges;

		let media = MediaPlaylist::parse(&document.body)?;
		debug!(segments = media.segments.len(), %url, "loaded media playlist");
		Ok(media)
	}

	/// Resolve a playlist or segment URI against the base URL.
	///
	/// Inputs containing `://` are absolute; anything else replaces the last
	/// path component of the reference URL.
	pub fn resolve(&self, uri: &str) -> Result<Url, LoaderError> {
		resolve_uri(&self.base, uri)
	}

	pub fn supports_ranges(&self) -> bool {
		self.supports_ranges
	}

	pub fn base(&self) -> &Url {
		&self.base
	}
}

/// Resolve `value` against `base`: absolute if it parses on its own,
/// otherwise joined onto the base's directory.
pub fn resolve_uri(base: &Url, value: &str) -> Result<Url, LoaderError> {
	if value.contains("://") {
		return Url::parse(value).map_err(|_| LoaderError::InvalidUrl);
	}

	base.join(value).map_err(|_| LoaderError::InvalidUrl)
}

//! M3U8 playlist parsing and serialization.
//!
//! Implements the RFC 8216 subset the engine consumes: master playlists
//! (variant streams, alternative renditions, session metadata) and media
//! playlists (segments with durations, byte ranges, and initialization
//! sections). Unknown tags are ignored for forward compatibility.

mod attrs;
mod master;
mod media;
mod serialize;

pub use attrs::*;
pub use master::*;
pub use media::*;

use crate::ParseError;

/// A parsed playlist, either the top-level master or a single rendition.
#[derive(Debug, Clone, PartialEq)]
pub enum Playlist {
	Master(MasterPlaylist),
	Media(MediaPlaylist),
}

impl Playlist {
	/// Parse a playlist body, trying master first and falling back to media.
	///
	/// The fallback mirrors the loader's retry: a media-only tag aborts the
	/// master parse with [`ParseError::MediaInsteadOfMaster`], which is the
	/// cue to re-parse the same document as a media playlist.
	pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
		match MasterPlaylist::parse(data) {
			Ok(master) => Ok(Self::Master(master)),
			Err(ParseError::MediaInsteadOfMaster) => Ok(Self::Media(MediaPlaylist::parse(data)?)),
			Err(err) => Err(err),
		}
	}
}

/// A `length@offset` sub-range of a resource.
///
/// The offset is optional in the source text; a range without an offset
/// continues where the previous range of the same resource ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
	pub length: u64,
	pub offset: Option<u64>,
}

impl ByteRange {
	/// Parse the `length[@offset]` form used by `EXT-X-BYTERANGE` and the
	/// `BYTERANGE` attribute of `EXT-X-MAP`.
	pub fn parse(value: &str) -> Option<Self> {
		let mut parts = value.splitn(2, '@');
		let length = parts.next()?.trim().parse().ok()?;
		let offset = match parts.next() {
			Some(offset) => Some(offset.trim().parse().ok()?),
			None => None,
		};

		Some(Self { length, offset })
	}
}

impl std::fmt::Display for ByteRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.offset {
			Some(offset) => write!(f, "{}@{}", self.length, offset),
			None => write!(f, "{}", self.length),
		}
	}
}

/// A display resolution, kept as the raw `WxH` string alongside the parsed
/// pair so serialization never loses information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
	pub raw: String,
	pub width: u32,
	pub height: u32,
}

impl Resolution {
	pub fn parse(value: &str) -> Option<Self> {
		let (width, height) = value.split_once(['x', 'X'])?;

		Some(Self {
			raw: value.to_string(),
			width: width.trim().parse().ok()?,
			height: height.trim().parse().ok()?,
		})
	}
}

/// The preferred playback start point from `EXT-X-START`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPoint {
	pub time_offset: f64,
	pub precise: bool,
}

/// Split the body into lines and verify the `#EXTM3U` header.
///
/// Returns the lines after the header, with any trailing `\r` stripped.
pub(crate) fn header_checked_lines(data: &[u8]) -> Result<impl Iterator<Item = &str>, ParseError> {
	let text = std::str::from_utf8(data).map_err(|_| ParseError::InvalidEncoding)?;

	let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));
	match lines.find(|line| !line.trim().is_empty()) {
		Some("#EXTM3U") => Ok(lines),
		_ => Err(ParseError::InvalidFormat("missing #EXTM3U header".to_string())),
	}
}

/// Split a tag line (without the leading `#`) into its name and parameters.
pub(crate) fn split_tag(tag: &str) -> (&str, &str) {
	match tag.split_once(':') {
		Some((name, params)) => (name, params),
		None => (tag, ""),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_range_with_offset() {
		let range = ByteRange::parse("15000@4096").unwrap();
		assert_eq!(range.length, 15000);
		assert_eq!(range.offset, Some(4096));
	}

	#[test]
	fn byte_range_without_offset() {
		let range = ByteRange::parse("800").unwrap();
		assert_eq!(range.length, 800);
		assert_eq!(range.offset, None);
	}

	#[test]
	fn byte_range_rejects_garbage() {
		assert_eq!(ByteRange::parse("15000@"), None);
		assert_eq!(ByteRange::parse("@4096"), None);
		assert_eq!(ByteRange::parse(""), None);
	}

	#[test]
	fn resolution_keeps_the_raw_string() {
		let res = Resolution::parse("1920x1080").unwrap();
		assert_eq!(res.raw, "1920x1080");
		assert_eq!(res.width, 1920);
		assert_eq!(res.height, 1080);
	}

	#[test]
	fn header_is_required() {
		assert!(matches!(
			MasterPlaylist::parse(b"#EXT-X-STREAM-INF:BANDWIDTH=1\nv.m3u8\n"),
			Err(ParseError::InvalidFormat(_))
		));
	}

	#[test]
	fn header_may_follow_blank_lines() {
		assert!(MasterPlaylist::parse(b"\r\n\n#EXTM3U\n").is_ok());
	}

	#[test]
	fn invalid_utf8_is_rejected() {
		assert_eq!(MasterPlaylist::parse(b"#EXTM3U\n\xff\xfe"), Err(ParseError::InvalidEncoding));
	}

	#[test]
	fn parse_falls_back_to_media() {
		let body = b"#EXTM3U\n#EXTINF:6.0,\nseg0.mp4\n";
		match Playlist::parse(body).unwrap() {
			Playlist::Media(media) => assert_eq!(media.segments.len(), 1),
			Playlist::Master(_) => panic!("expected a media playlist"),
		}
	}
}

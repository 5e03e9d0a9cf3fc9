use crate::ParseError;

use super::{header_checked_lines, split_tag, AttributeList, ByteRange};

/// A per-rendition manifest describing ordered media segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaPlaylist {
	pub target_duration: Option<u64>,
	pub media_sequence: Option<u64>,
	pub discontinuity_sequence: Option<u64>,
	pub endlist: bool,
	pub playlist_type: Option<PlaylistType>,
	pub has_iframes_only: bool,
	pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistType {
	Event,
	Vod,
}

impl PlaylistType {
	pub(crate) fn as_str(self) -> &'static str {
		match self {
			Self::Event => "EVENT",
			Self::Vod => "VOD",
		}
	}
}

/// The initialization section declared by `EXT-X-MAP`.
///
/// Sticky: once latched it applies to every following segment until another
/// `EXT-X-MAP` replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSection {
	pub uri: String,
	pub byte_range: Option<ByteRange>,
}

/// One media segment with the metadata latched by its preceding tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
	/// Duration in seconds from `EXTINF`.
	pub duration: Option<f64>,

	/// Sub-range of the resource from `EXT-X-BYTERANGE`.
	pub byte_range: Option<ByteRange>,

	pub uri: String,

	/// The initialization section in effect for this segment, shared with
	/// every other segment under the same `EXT-X-MAP`.
	pub init_section: Option<InitSection>,

	/// Whether a discontinuity precedes this segment.
	pub discontinuity: bool,
}

impl MediaPlaylist {
	/// Parse a media playlist body.
	///
	/// `EXTINF` and `EXT-X-BYTERANGE` latch metadata for the next URI line
	/// and are cleared once consumed; `EXT-X-MAP` latches until replaced.
	pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
		let lines = header_checked_lines(data)?;

		let mut playlist = Self::default();
		let mut pending_duration: Option<f64> = None;
		let mut pending_range: Option<ByteRange> = None;
		let mut pending_discontinuity = false;
		let mut current_map: Option<InitSection> = None;

		for line in lines {
			if line.trim().is_empty() {
				continue;
			}

			let Some(tag) = line.strip_prefix('#') else {
				playlist.segments.push(Segment {
					duration: pending_duration.take(),
					byte_range: pending_range.take(),
					uri: line.to_string(),
					init_section: current_map.clone(),
					discontinuity: std::mem::take(&mut pending_discontinuity),
				});
				continue;
			};

			let (name, params) = split_tag(tag);
			match name {
				"EXTM3U" => {}
				"EXTINF" => {
					// The duration is everything before the title comma.
					let duration = params.split(',').next().unwrap_or("");
					pending_duration = duration.trim().parse().ok();
				}
				"EXT-X-BYTERANGE" => pending_range = ByteRange::parse(params),
				"EXT-X-MAP" => {
					let attrs = AttributeList::parse(params);
					let Some(uri) = attrs.get("URI") else {
						return Err(ParseError::InvalidFormat("EXT-X-MAP without URI".to_string()));
					};
					current_map = Some(InitSection {
						uri: uri.to_string(),
						byte_range: attrs.get("BYTERANGE").and_then(ByteRange::parse),
					});
				}
				"EXT-X-TARGETDURATION" => playlist.target_duration = params.trim().parse().ok(),
				"EXT-X-MEDIA-SEQUENCE" => playlist.media_sequence = params.trim().parse().ok(),
				"EXT-X-DISCONTINUITY-SEQUENCE" => {
					playlist.discontinuity_sequence = params.trim().parse().ok()
				}
				"EXT-X-DISCONTINUITY" => pending_discontinuity = true,
				"EXT-X-ENDLIST" => playlist.endlist = true,
				"EXT-X-PLAYLIST-TYPE" => {
					playlist.playlist_type = match params.trim() {
						"EVENT" => Some(PlaylistType::Event),
						"VOD" => Some(PlaylistType::Vod),
						_ => None,
					}
				}
				"EXT-X-I-FRAMES-ONLY" => playlist.has_iframes_only = true,
				_ => {}
			}
		}

		Ok(playlist)
	}

	/// Total duration of all segments, in seconds.
	pub fn total_duration(&self) -> f64 {
		self.segments.iter().filter_map(|s| s.duration).sum()
	}
}

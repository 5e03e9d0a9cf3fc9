use crate::ParseError;

use super::{header_checked_lines, split_tag, AttributeList, Resolution, StartPoint};

/// The top-level manifest describing the available renditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterPlaylist {
	pub streams: Vec<Stream>,
	pub iframe_streams: Vec<Stream>,
	pub media: Vec<MediaTag>,

	/// Raw `EXT-X-SESSION-DATA` attribute lists, passed through untouched.
	pub session_data: Vec<AttributeList>,

	/// Raw `EXT-X-SESSION-KEY` attribute lists, passed through untouched.
	pub session_keys: Vec<AttributeList>,

	pub has_independent_segments: bool,
	pub start: Option<StartPoint>,
}

/// One variant stream from `EXT-X-STREAM-INF` or `EXT-X-I-FRAME-STREAM-INF`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
	pub bandwidth: Option<u64>,
	pub average_bandwidth: Option<u64>,
	pub codecs: Option<String>,
	pub resolution: Option<Resolution>,
	pub frame_rate: Option<f64>,
	pub hdcp_level: Option<String>,
	pub audio: Option<String>,
	pub video: Option<String>,
	pub subtitles: Option<String>,
	pub closed_captions: Option<String>,
	pub uri: Option<String>,
}

impl Stream {
	fn from_attributes(attrs: &AttributeList) -> Self {
		Self {
			bandwidth: attrs.get("BANDWIDTH").and_then(|v| v.parse().ok()),
			average_bandwidth: attrs.get("AVERAGE-BANDWIDTH").and_then(|v| v.parse().ok()),
			codecs: attrs.get("CODECS").map(str::to_string),
			resolution: attrs.get("RESOLUTION").and_then(Resolution::parse),
			frame_rate: attrs.get("FRAME-RATE").and_then(|v| v.parse().ok()),
			hdcp_level: attrs.get("HDCP-LEVEL").map(str::to_string),
			audio: attrs.get("AUDIO").map(str::to_string),
			video: attrs.get("VIDEO").map(str::to_string),
			subtitles: attrs.get("SUBTITLES").map(str::to_string),
			closed_captions: attrs.get("CLOSED-CAPTIONS").map(str::to_string),
			uri: attrs.get("URI").map(str::to_string),
		}
	}
}

/// The rendition type of an `EXT-X-MEDIA` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTagType {
	Audio,
	Video,
	Subtitles,
	ClosedCaptions,
}

impl MediaTagType {
	fn parse(value: &str) -> Option<Self> {
		match value {
			"AUDIO" => Some(Self::Audio),
			"VIDEO" => Some(Self::Video),
			"SUBTITLES" => Some(Self::Subtitles),
			"CLOSED-CAPTIONS" => Some(Self::ClosedCaptions),
			_ => None,
		}
	}

	pub(crate) fn as_str(self) -> &'static str {
		match self {
			Self::Audio => "AUDIO",
			Self::Video => "VIDEO",
			Self::Subtitles => "SUBTITLES",
			Self::ClosedCaptions => "CLOSED-CAPTIONS",
		}
	}
}

/// One alternative rendition from `EXT-X-MEDIA`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTag {
	pub media_type: MediaTagType,
	pub group_id: Option<String>,
	pub language: Option<String>,
	pub name: Option<String>,
	pub default: bool,
	pub autoselect: bool,
	pub forced: bool,
	pub channels: Option<String>,
	pub uri: Option<String>,
}

impl MediaTag {
	fn from_attributes(attrs: &AttributeList) -> Option<Self> {
		Some(Self {
			media_type: MediaTagType::parse(attrs.get("TYPE")?)?,
			group_id: attrs.get("GROUP-ID").map(str::to_string),
			language: attrs.get("LANGUAGE").map(str::to_string),
			name: attrs.get("NAME").map(str::to_string),
			default: attrs.get_flag("DEFAULT"),
			autoselect: attrs.get_flag("AUTOSELECT"),
			forced: attrs.get_flag("FORCED"),
			channels: attrs.get("CHANNELS").map(str::to_string),
			uri: attrs.get("URI").map(str::to_string),
		})
	}
}

/// Tags that only appear in media playlists; any of them aborts a master
/// parse with [`ParseError::MediaInsteadOfMaster`].
fn is_media_only_tag(name: &str) -> bool {
	matches!(
		name,
		"EXTINF"
			| "EXT-X-TARGETDURATION"
			| "EXT-X-MEDIA-SEQUENCE"
			| "EXT-X-DISCONTINUITY-SEQUENCE"
			| "EXT-X-DISCONTINUITY"
			| "EXT-X-ENDLIST"
			| "EXT-X-PLAYLIST-TYPE"
			| "EXT-X-I-FRAMES-ONLY"
			| "EXT-X-BYTERANGE"
			| "EXT-X-MAP"
			| "EXT-X-KEY"
			| "EXT-X-PROGRAM-DATE-TIME"
			| "EXT-X-GAP"
	)
}

impl MasterPlaylist {
	/// Parse a master playlist body.
	pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
		let lines = header_checked_lines(data)?;

		let mut master = Self::default();
		let mut pending_stream: Option<Stream> = None;

		for line in lines {
			if line.trim().is_empty() {
				continue;
			}

			let Some(tag) = line.strip_prefix('#') else {
				// A bare line is the URI for the stream latched above it.
				if let Some(mut stream) = pending_stream.take() {
					stream.uri = Some(line.to_string());
					master.streams.push(stream);
				}
				continue;
			};

			let (name, params) = split_tag(tag);
			match name {
				"EXTM3U" => {}
				"EXT-X-MEDIA" => {
					let attrs = AttributeList::parse(params);
					if let Some(media) = MediaTag::from_attributes(&attrs) {
						master.media.push(media);
					}
				}
				"EXT-X-STREAM-INF" => {
					let attrs = AttributeList::parse(params);
					pending_stream = Some(Stream::from_attributes(&attrs));
				}
				"EXT-X-I-FRAME-STREAM-INF" => {
					// I-frame streams carry their URI as an attribute.
					let attrs = AttributeList::parse(params);
					master.iframe_streams.push(Stream::from_attributes(&attrs));
				}
				"EXT-X-SESSION-DATA" => master.session_data.push(AttributeList::parse(params)),
				"EXT-X-SESSION-KEY" => master.session_keys.push(AttributeList::parse(params)),
				"EXT-X-INDEPENDENT-SEGMENTS" => master.has_independent_segments = true,
				"EXT-X-START" => {
					let attrs = AttributeList::parse(params);
					if let Some(time_offset) = attrs.get("TIME-OFFSET").and_then(|v| v.parse().ok()) {
						master.start = Some(StartPoint {
							time_offset,
							precise: attrs.get_flag("PRECISE"),
						});
					}
				}
				name if is_media_only_tag(name) => return Err(ParseError::MediaInsteadOfMaster),
				_ => {}
			}
		}

		// An EXT-X-STREAM-INF at the end of the file never saw its URI line.
		if let Some(stream) = pending_stream {
			master.streams.push(stream);
		}

		Ok(master)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MASTER: &str = "#EXTM3U\n\
		#EXT-X-INDEPENDENT-SEGMENTS\n\
		#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"aud\",NAME=\"English\",LANGUAGE=\"en\",DEFAULT=YES,AUTOSELECT=YES,URI=\"audio/en.m3u8\"\n\
		#EXT-X-STREAM-INF:BANDWIDTH=5000000,AVERAGE-BANDWIDTH=4500000,CODECS=\"avc1.64002a,mp4a.40.2\",RESOLUTION=1920x1080,FRAME-RATE=29.970,AUDIO=\"aud\"\n\
		video/1080p.m3u8\n\
		#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720,AUDIO=\"aud\"\n\
		video/720p.m3u8\n\
		#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=200000,RESOLUTION=1920x1080,URI=\"iframe/1080p.m3u8\"\n\
		#EXT-X-SESSION-DATA:DATA-ID=\"com.example.title\",VALUE=\"Example\"\n\
		#EXT-X-START:TIME-OFFSET=-12.5,PRECISE=YES\n";

	#[test]
	fn parses_streams_in_order() {
		let master = MasterPlaylist::parse(MASTER.as_bytes()).unwrap();
		assert_eq!(master.streams.len(), 2);

		let first = &master.streams[0];
		assert_eq!(first.bandwidth, Some(5_000_000));
		assert_eq!(first.average_bandwidth, Some(4_500_000));
		assert_eq!(first.codecs.as_deref(), Some("avc1.64002a,mp4a.40.2"));
		assert_eq!(first.resolution.as_ref().unwrap().height, 1080);
		assert_eq!(first.frame_rate, Some(29.97));
		assert_eq!(first.audio.as_deref(), Some("aud"));
		assert_eq!(first.uri.as_deref(), Some("video/1080p.m3u8"));

		assert_eq!(master.streams[1].uri.as_deref(), Some("video/720p.m3u8"));
	}

	#[test]
	fn parses_media_tags() {
		let master = MasterPlaylist::parse(MASTER.as_bytes()).unwrap();
		assert_eq!(master.media.len(), 1);

		let media = &master.media[0];
		assert_eq!(media.media_type, MediaTagType::Audio);
		assert_eq!(media.group_id.as_deref(), Some("aud"));
		assert_eq!(media.language.as_deref(), Some("en"));
		assert!(media.default);
		assert!(media.autoselect);
		assert!(!media.forced);
		assert_eq!(media.uri.as_deref(), Some("audio/en.m3u8"));
	}

	#[test]
	fn iframe_streams_take_their_uri_from_the_attribute() {
		let master = MasterPlaylist::parse(MASTER.as_bytes()).unwrap();
		assert_eq!(master.iframe_streams.len(), 1);
		assert_eq!(master.iframe_streams[0].uri.as_deref(), Some("iframe/1080p.m3u8"));
	}

	#[test]
	fn session_and_start_metadata() {
		let master = MasterPlaylist::parse(MASTER.as_bytes()).unwrap();
		assert!(master.has_independent_segments);
		assert_eq!(master.session_data.len(), 1);
		assert_eq!(master.session_data[0].get("DATA-ID"), Some("com.example.title"));

		let start = master.start.unwrap();
		assert_eq!(start.time_offset, -12.5);
		assert!(start.precise);
	}

	#[test]
	fn media_only_tag_aborts_the_parse() {
		let body = b"#EXTM3U\n#EXTINF:6.0,\nseg0.mp4\n";
		assert_eq!(MasterPlaylist::parse(body), Err(ParseError::MediaInsteadOfMaster));

		let body = b"#EXTM3U\n#EXT-X-TARGETDURATION:6\n";
		assert_eq!(MasterPlaylist::parse(body), Err(ParseError::MediaInsteadOfMaster));
	}

	#[test]
	fn unknown_tags_are_ignored() {
		let body = b"#EXTM3U\n#EXT-X-FANCY-NEW-TAG:WHATEVER=1\n";
		let master = MasterPlaylist::parse(body).unwrap();
		assert!(master.streams.is_empty());
	}
}

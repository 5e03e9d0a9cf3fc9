//! Serialization of parsed playlists back to RFC 8216 text.
//!
//! The output is not guaranteed to be byte-identical to the source, but it
//! reparses to an equivalent tree: tag order within a segment, attribute
//! order in pass-through lists, resolution strings, and URIs are preserved.

use std::fmt::Write;

use super::{AttributeList, MasterPlaylist, MediaPlaylist, MediaTag, Stream};

/// Quote an attribute value unless it is a plain token (numbers, enumerated
/// strings, resolutions). Quoting anything else keeps commas reparseable.
fn is_plain_token(value: &str) -> bool {
	!value.is_empty()
		&& value
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | 'x'))
}

fn push_attr(out: &mut String, first: &mut bool, key: &str, value: &str, quoted: bool) {
	if !*first {
		out.push(',');
	}
	*first = false;

	if quoted || !is_plain_token(value) {
		let _ = write!(out, "{key}=\"{value}\"");
	} else {
		let _ = write!(out, "{key}={value}");
	}
}

fn push_attr_list(out: &mut String, tag: &str, attrs: &AttributeList) {
	out.push_str(tag);
	out.push(':');
	let mut first = true;
	for attr in &attrs.0 {
		push_attr(out, &mut first, &attr.key, &attr.value, false);
	}
	out.push('\n');
}

fn push_stream_attrs(out: &mut String, first: &mut bool, stream: &Stream) {
	if let Some(bandwidth) = stream.bandwidth {
		push_attr(out, first, "BANDWIDTH", &bandwidth.to_string(), false);
	}
	if let Some(average) = stream.average_bandwidth {
		push_attr(out, first, "AVERAGE-BANDWIDTH", &average.to_string(), false);
	}
	if let Some(codecs) = &stream.codecs {
		push_attr(out, first, "CODECS", codecs, true);
	}
	if let Some(resolution) = &stream.resolution {
		push_attr(out, first, "RESOLUTION", &resolution.raw, false);
	}
	if let Some(frame_rate) = stream.frame_rate {
		push_attr(out, first, "FRAME-RATE", &frame_rate.to_string(), false);
	}
	if let Some(hdcp) = &stream.hdcp_level {
		push_attr(out, first, "HDCP-LEVEL", hdcp, false);
	}
	if let Some(audio) = &stream.audio {
		push_attr(out, first, "AUDIO", audio, true);
	}
	if let Some(video) = &stream.video {
		push_attr(out, first, "VIDEO", video, true);
	}
	if let Some(subtitles) = &stream.subtitles {
		push_attr(out, first, "SUBTITLES", subtitles, true);
	}
	if let Some(cc) = &stream.closed_captions {
		push_attr(out, first, "CLOSED-CAPTIONS", cc, cc != "NONE");
	}
}

fn push_media_tag(out: &mut String, media: &MediaTag) {
	out.push_str("#EXT-X-MEDIA:");
	let mut first = true;
	push_attr(out, &mut first, "TYPE", media.media_type.as_str(), false);
	if let Some(group_id) = &media.group_id {
		push_attr(out, &mut first, "GROUP-ID", group_id, true);
	}
	if let Some(language) = &media.language {
		push_attr(out, &mut first, "LANGUAGE", language, true);
	}
	if let Some(name) = &media.name {
		push_attr(out, &mut first, "NAME", name, true);
	}
	if media.default {
		push_attr(out, &mut first, "DEFAULT", "YES", false);
	}
	if media.autoselect {
		push_attr(out, &mut first, "AUTOSELECT", "YES", false);
	}
	if media.forced {
		push_attr(out, &mut first, "FORCED", "YES", false);
	}
	if let Some(channels) = &media.channels {
		push_attr(out, &mut first, "CHANNELS", channels, true);
	}
	if let Some(uri) = &media.uri {
		push_attr(out, &mut first, "URI", uri, true);
	}
	out.push('\n');
}

impl MasterPlaylist {
	/// Render this playlist as RFC 8216 text.
	pub fn serialize(&self) -> String {
		let mut out = String::from("#EXTM3U\n");

		if self.has_independent_segments {
			out.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");
		}

		for media in &self.media {
			push_media_tag(&mut out, media);
		}

		for stream in &self.streams {
			out.push_str("#EXT-X-STREAM-INF:");
			let mut first = true;
			push_stream_attrs(&mut out, &mut first, stream);
			out.push('\n');
			if let Some(uri) = &stream.uri {
				out.push_str(uri);
				out.push('\n');
			}
		}

		for stream in &self.iframe_streams {
			out.push_str("#EXT-X-I-FRAME-STREAM-INF:");
			let mut first = true;
			push_stream_attrs(&mut out, &mut first, stream);
			if let Some(uri) = &stream.uri {
				push_attr(&mut out, &mut first, "URI", uri, true);
			}
			out.push('\n');
		}

		for data in &self.session_data {
			push_attr_list(&mut out, "#EXT-X-SESSION-DATA", data);
		}
		for key in &self.session_keys {
			push_attr_list(&mut out, "#EXT-X-SESSION-KEY", key);
		}

		if let Some(start) = &self.start {
			let _ = write!(out, "#EXT-X-START:TIME-OFFSET={}", start.time_offset);
			if start.precise {
				out.push_str(",PRECISE=YES");
			}
			out.push('\n');
		}

		out
	}
}

impl MediaPlaylist {
	/// Render this playlist as RFC 8216 text.
	pub fn serialize(&self) -> String {
		let mut out = String::from("#EXTM3U\n");

		if let Some(target) = self.target_duration {
			let _ = writeln!(out, "#EXT-X-TARGETDURATION:{target}");
		}
		if let Some(sequence) = self.media_sequence {
			let _ = writeln!(out, "#EXT-X-MEDIA-SEQUENCE:{sequence}");
		}
		if let Some(sequence) = self.discontinuity_sequence {
			let _ = writeln!(out, "#EXT-X-DISCONTINUITY-SEQUENCE:{sequence}");
		}
		if let Some(playlist_type) = self.playlist_type {
			let _ = writeln!(out, "#EXT-X-PLAYLIST-TYPE:{}", playlist_type.as_str());
		}
		if self.has_iframes_only {
			out.push_str("#EXT-X-I-FRAMES-ONLY\n");
		}

		let mut current_map = None;
		for segment in &self.segments {
			if segment.discontinuity {
				out.push_str("#EXT-X-DISCONTINUITY\n");
			}

			// EXT-X-MAP is sticky, so only emit it when it changes.
			if segment.init_section != current_map {
				if let Some(init) = &segment.init_section {
					let _ = write!(out, "#EXT-X-MAP:URI=\"{}\"", init.uri);
					if let Some(range) = init.byte_range {
						let _ = write!(out, ",BYTERANGE=\"{range}\"");
					}
					out.push('\n');
				}
				current_map = segment.init_section.clone();
			}

			if let Some(duration) = segment.duration {
				let _ = writeln!(out, "#EXTINF:{duration},");
			}
			if let Some(range) = segment.byte_range {
				let _ = writeln!(out, "#EXT-X-BYTERANGE:{range}");
			}
			out.push_str(&segment.uri);
			out.push('\n');
		}

		if self.endlist {
			out.push_str("#EXT-X-ENDLIST\n");
		}

		out
	}
}

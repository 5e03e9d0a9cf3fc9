//! Sample production from assembled segment files.
//!
//! A [`SampleProducer`] wraps one assembled media file (initialization
//! section plus fragment), demuxes the track matching the requested media
//! kind, and yields its samples in decode order. Samples are in the track's
//! native format; no transcoding happens here.

use std::collections::VecDeque;
use std::path::PathBuf;

use bytes::Bytes;
use mp4_atom::{Any, DecodeMaybe, Moof, Moov};
use tracing::warn;

use crate::fetch::BoxFuture;
use crate::{MediaKind, ProducerError, SampleBuffer, Timestamp};

/// A source of ordered sample buffers.
///
/// The render queue consumes producers through this trait so it does not
/// care whether samples come from a demuxed file or somewhere else.
pub trait Produce: Send {
	/// The next sample, or `None` when drained or unopenable.
	fn produce(&mut self) -> BoxFuture<'_, Option<SampleBuffer>>;

	/// Whether this producer will never yield another sample.
	fn is_finished(&self) -> bool;
}

/// Yields the sample buffers of one track of one media asset, in order.
///
/// The asset is opened lazily on the first [`produce`](Self::produce) call.
/// `produce` returns `None` both at end of stream and when the asset could
/// not be opened; [`is_finished`](Self::is_finished) reports `true` in
/// either case once the producer is drained.
pub struct SampleProducer {
	path: PathBuf,
	kind: MediaKind,

	/// Samples before this asset-local time are dropped, for seeks landing
	/// inside a segment.
	time_offset: Timestamp,

	samples: VecDeque<SampleBuffer>,
	started: bool,
	finished: bool,
}

impl SampleProducer {
	pub fn new(path: PathBuf, kind: MediaKind, time_offset: Timestamp) -> Self {
		Self {
			path,
			kind,
			time_offset,
			samples: VecDeque::new(),
			started: false,
			finished: false,
		}
	}

	/// The next sample buffer, or `None` when drained.
	pub async fn produce(&mut self) -> Option<SampleBuffer> {
		if self.finished {
			return None;
		}

		if !self.started {
			self.started = true;
			if let Err(err) = self.load().await {
				// Producer failures never propagate; the asset just plays
				// as empty and the queue moves on.
				warn!(path = %self.path.display(), %err, "sample producer failed to open asset");
				self.finished = true;
				return None;
			}
		}

		match self.samples.pop_front() {
			Some(sample) => Some(sample),
			None => {
				self.finished = true;
				None
			}
		}
	}

	pub fn is_finished(&self) -> bool {
		self.finished
	}

	async fn load(&mut self) -> Result<(), ProducerError> {
		let data = tokio::fs::read(&self.path)
			.await
			.map_err(|err| ProducerError::AssetUnopenable(err.to_string()))?;

		self.samples = demux(&data, self.kind, self.time_offset)?;
		Ok(())
	}
}

impl Produce for SampleProducer {
	fn produce(&mut self) -> BoxFuture<'_, Option<SampleBuffer>> {
		Box::pin(SampleProducer::produce(self))
	}

	fn is_finished(&self) -> bool {
		SampleProducer::is_finished(self)
	}
}

struct TrackInfo {
	track_id: u32,
	timescale: u64,
	default_duration: u32,
	default_size: u32,
	default_flags: u32,
	video: bool,
}

/// Walk the fMP4 atoms and collect the samples of the selected track.
fn demux(data: &[u8], kind: MediaKind, time_offset: Timestamp) -> Result<VecDeque<SampleBuffer>, ProducerError> {
	let mut cursor = std::io::Cursor::new(data);
	let mut position = 0usize;

	let mut track: Option<TrackInfo> = None;
	let mut moof: Option<(Moof, usize)> = None;
	let mut samples = VecDeque::new();

	while let Some(atom) =
		Any::decode_maybe(&mut cursor).map_err(|err| ProducerError::AssetUnopenable(err.to_string()))?
	{
		let size = cursor.position() as usize - position;
		position = cursor.position() as usize;

		match atom {
			Any::Moov(moov) => track = Some(select_track(&moov, kind)?),
			Any::Moof(parsed) => moof = Some((parsed, size)),
			Any::Mdat(mdat) => {
				let Some((moof, moof_size)) = moof.take() else {
					continue;
				};
				let Some(track) = &track else {
					continue;
				};

				let mdat = Bytes::from(mdat.data);
				let header_size = size - mdat.len();
				extract(&mut samples, track, &moof, moof_size, header_size, mdat, time_offset);
			}
			// ftyp/styp/sidx and friends carry nothing we need.
			_ => {}
		}
	}

	if track.is_none() {
		return Err(ProducerError::AssetUnopenable("missing moov box".to_string()));
	}

	Ok(samples)
}

/// The first track whose handler matches the requested media kind.
fn select_track(moov: &Moov, kind: MediaKind) -> Result<TrackInfo, ProducerError> {
	for trak in &moov.trak {
		let wanted = match trak.mdia.hdlr.handler.as_ref() {
			b"vide" => kind == MediaKind::Video,
			b"soun" => kind == MediaKind::Audio,
			_ => false,
		};
		if !wanted {
			continue;
		}

		let track_id = trak.tkhd.track_id;
		let trex = moov
			.mvex
			.as_ref()
			.and_then(|mvex| mvex.trex.iter().find(|trex| trex.track_id == track_id));

		return Ok(TrackInfo {
			track_id,
			timescale: trak.mdia.mdhd.timescale as u64,
			default_duration: trex.map(|trex| trex.default_sample_duration).unwrap_or_default(),
			default_size: trex.map(|trex| trex.default_sample_size).unwrap_or_default(),
			default_flags: trex.map(|trex| trex.default_sample_flags).unwrap_or_default(),
			video: kind == MediaKind::Video,
		});
	}

	Err(ProducerError::NoMatchingTrack)
}

/// Pull the selected track's samples out of one moof+mdat pair.
fn extract(
	samples: &mut VecDeque<SampleBuffer>,
	track: &TrackInfo,
	moof: &Moof,
	moof_size: usize,
	header_size: usize,
	mdat: Bytes,
	time_offset: Timestamp,
) {
	for traf in &moof.traf {
		let tfhd = &traf.tfhd;
		if tfhd.track_id != track.track_id {
			continue;
		}

		let Some(tfdt) = traf.tfdt.as_ref() else {
			warn!("fragment without tfdt box, skipping");
			continue;
		};

		let mut dts = tfdt.base_media_decode_time;
		let mut offset = tfhd.base_data_offset.unwrap_or_default() as usize;

		for trun in &traf.trun {
			if let Some(data_offset) = trun.data_offset {
				// Relative to the start of the moof, not the mdat payload.
				let base_offset = tfhd.base_data_offset.unwrap_or_default() as usize;
				let Ok(data_offset) = usize::try_from(data_offset) else {
					warn!("negative trun data offset, skipping run");
					continue;
				};
				if data_offset < moof_size + header_size {
					warn!("trun data offset inside the moof, skipping run");
					continue;
				}
				offset = base_offset + data_offset - moof_size - header_size;
			}

			for entry in &trun.entries {
				// Fall back to the fragment and then movie-level defaults.
				let flags = entry.flags.unwrap_or(tfhd.default_sample_flags.unwrap_or(track.default_flags));
				let duration = entry
					.duration
					.unwrap_or(tfhd.default_sample_duration.unwrap_or(track.default_duration));
				let size = entry.size.unwrap_or(tfhd.default_sample_size.unwrap_or(track.default_size)) as usize;

				if offset + size > mdat.len() {
					warn!("sample extends past the mdat payload, dropping the rest");
					return;
				}

				let pts = dts as i64 + entry.cts.unwrap_or_default() as i64;
				let payload = mdat.slice(offset..offset + size);

				dts += duration as u64;
				offset += size;

				let sample = SampleBuffer {
					pts,
					timescale: track.timescale,
					duration,
					keyframe: !track.video || sample_flags_keyframe(flags),
					payload,
				};

				// Honor the producer's start time; invalid timestamps pass
				// through for the queue to discard.
				if let Some(timestamp) = sample.timestamp() {
					if timestamp < time_offset {
						continue;
					}
				}

				samples.push_back(sample);
			}
		}
	}
}

/// Keyframe per the trun sample flags: depends on no other sample and is not
/// marked non-sync.
fn sample_flags_keyframe(flags: u32) -> bool {
	let depends_on_none = (flags >> 24) & 0x3 == 0x2;
	let non_sync = (flags >> 16) & 0x1 == 0x1;
	depends_on_none && !non_sync
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyframe_flag_bits() {
		// sample_depends_on = 2 (no dependencies), sync sample.
		assert!(sample_flags_keyframe(0x0200_0000));
		// sample_depends_on = 1 (depends on others).
		assert!(!sample_flags_keyframe(0x0100_0000));
		// Depends on nothing but explicitly non-sync.
		assert!(!sample_flags_keyframe(0x0201_0000));
	}

	#[tokio::test]
	async fn missing_asset_finishes_quietly() {
		let mut producer = SampleProducer::new(
			PathBuf::from("/nonexistent/asset.mp4"),
			MediaKind::Video,
			Timestamp::ZERO,
		);

		assert!(!producer.is_finished());
		assert!(producer.produce().await.is_none());
		assert!(producer.is_finished());
	}

	#[tokio::test]
	async fn garbage_asset_finishes_quietly() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("garbage.mp4");
		std::fs::write(&path, b"this is not an mp4 file at all").unwrap();

		let mut producer = SampleProducer::new(path, MediaKind::Video, Timestamp::ZERO);
		assert!(producer.produce().await.is_none());
		assert!(producer.is_finished());
	}
}

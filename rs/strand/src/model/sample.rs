use bytes::Bytes;
use derive_more::Debug;

use crate::Timestamp;

/// The kind of media carried by a track or requested from a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
	Video,
	Audio,
}

/// One compressed media unit with its presentation timestamp.
///
/// Sample buffers keep the raw timestamp of their source track; the render
/// queue rewrites `pts` when splicing successive assets onto one timeline.
/// The debug implementation shows only the payload length for brevity.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
	/// Raw presentation timestamp in `timescale` units.
	///
	/// Signed because fMP4 composition offsets may push a sample before zero;
	/// such buffers are dropped by the render queue.
	pub pts: i64,

	/// Units per second for `pts` and `duration`.
	pub timescale: u64,

	/// Sample duration in `timescale` units.
	pub duration: u32,

	/// Whether this sample can be decoded independently.
	pub keyframe: bool,

	/// The encoded payload, still in the source codec.
	#[debug("{} bytes", payload.len())]
	pub payload: Bytes,
}

impl SampleBuffer {
	/// The presentation time on the microsecond timeline.
	///
	/// Returns `None` for buffers with a negative (invalid) timestamp.
	pub fn timestamp(&self) -> Option<Timestamp> {
		if self.pts < 0 {
			return None;
		}

		Some(Timestamp::from_scale(self.pts as u64, self.timescale))
	}
}

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;

use crate::produce::{Produce, SampleProducer};
use crate::{MediaKind, SampleBuffer, Timestamp};

/// The outcome of one [`RenderQueue::dequeue`] call.
#[derive(Debug)]
pub enum Dequeue {
	/// Every producer is drained and the queue was marked complete.
	Finished,

	/// Nothing to emit yet; more producers or samples are expected.
	Waiting,

	/// Internal bookkeeping happened; call again.
	Skip,

	/// The next sample, stamped onto the unified timeline.
	Frame(SampleBuffer),
}

struct QueueState {
	producers: Vec<Box<dyn Produce>>,
	pointer: usize,

	/// Samples already read from the current producer, awaiting emission.
	holding: VecDeque<SampleBuffer>,

	/// Where the current producer's output starts on the unified timeline.
	last_producer_offset: Timestamp,

	/// The highest PTS emitted so far, on the unified timeline.
	last_frame_pts: Timestamp,
}

/// Concatenates sample producers for successive segments behind a single
/// pull interface, rewriting timestamps onto one continuous timeline.
///
/// Producers are consumed strictly in append order. When a producer drains,
/// the next one starts at the last emitted PTS rather than at the segment's
/// nominal duration, which absorbs small inter-segment timing drift without
/// ever letting the emitted PTS run backwards.
pub struct RenderQueue {
	state: Mutex<QueueState>,
	complete: AtomicBool,
}

impl RenderQueue {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(QueueState {
				producers: Vec::new(),
				pointer: 0,
				holding: VecDeque::new(),
				last_producer_offset: Timestamp::ZERO,
				last_frame_pts: Timestamp::ZERO,
			}),
			complete: AtomicBool::new(false),
		}
	}

	/// Append a producer for the next segment file.
	pub async fn enqueue(&self, producer: Box<dyn Produce>) {
		self.state.lock().await.producers.push(producer);
	}

	/// Append a producer reading `kind` samples from an assembled asset.
	pub async fn enqueue_asset(&self, path: PathBuf, kind: MediaKind, time_offset: Timestamp) {
		self.enqueue(Box::new(SampleProducer::new(path, kind, time_offset))).await;
	}

	/// Latch completion: once every producer drains, `dequeue` reports
	/// [`Dequeue::Finished`] instead of [`Dequeue::Waiting`].
	pub fn complete(&self) {
		self.complete.store(true, Ordering::Relaxed);
	}

	/// Pull the next sample for a sink whose clock reads `_target`.
	pub async fn dequeue(&self, _target: Timestamp) -> Dequeue {
		let mut state = self.state.lock().await;

		// Past the last producer: drain the holding queue, then report
		// whether the session is done feeding us.
		if state.pointer >= state.producers.len() {
			if let Some(frame) = state.holding.pop_front() {
				return Dequeue::Frame(frame);
			}
			if self.complete.load(Ordering::Relaxed) {
				return Dequeue::Finished;
			}
			return Dequeue::Waiting;
		}

		if state.producers[state.pointer].is_finished() {
			// Splice the next producer at the last emitted PTS.
			state.pointer += 1;
			state.last_producer_offset = state.last_frame_pts;
			state.last_frame_pts = Timestamp::ZERO;
			return Dequeue::Skip;
		}

		let pointer = state.pointer;
		let produced = state.producers[pointer].produce().await;
		match produced {
			None => return Dequeue::Skip,
			Some(mut buffer) => {
				if buffer.pts < 0 {
					return Dequeue::Skip;
				}

				// Rebase the raw PTS in the buffer's own timescale so no
				// precision is lost for odd timescales.
				let rebase = state.last_producer_offset.to_scale(buffer.timescale);
				buffer.pts += rebase as i64;

				let stamped = Timestamp::from_scale(buffer.pts as u64, buffer.timescale);
				state.last_frame_pts = state.last_frame_pts.max(stamped);
				state.holding.push_back(buffer);
			}
		}

		match state.holding.pop_front() {
			Some(frame) => Dequeue::Frame(frame),
			// Unreachable after an append, but harmless to report.
			None => Dequeue::Waiting,
		}
	}
}

impl Default for RenderQueue {
	fn default() -> Self {
		Self::new()
	}
}

/// A producer yielding a fixed list of samples, for render tests.
#[cfg(test)]
pub(crate) struct ScriptedProducer {
	samples: VecDeque<SampleBuffer>,
	finished: bool,
}

#[cfg(test)]
impl ScriptedProducer {
	pub(crate) fn new(pts: &[i64], timescale: u64) -> Self {
		Self {
			samples: pts
				.iter()
				.map(|&pts| SampleBuffer {
					pts,
					timescale,
					duration: 0,
					keyframe: true,
					payload: bytes::Bytes::new(),
				})
				.collect(),
			finished: false,
		}
	}
}

#[cfg(test)]
impl Produce for ScriptedProducer {
	fn produce(&mut self) -> crate::fetch::BoxFuture<'_, Option<SampleBuffer>> {
		let next = self.samples.pop_front();
		if next.is_none() {
			self.finished = true;
		}
		Box::pin(async move { next })
	}

	fn is_finished(&self) -> bool {
		self.finished
	}
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::clock::PlaybackClock;
use crate::SampleBuffer;

use super::{Dequeue, RenderQueue};

/// Pause between polls when the sink is saturated or the queue is starved.
const POLL_BACKOFF: Duration = Duration::from_millis(10);

/// Rendering target for one media kind.
///
/// Sinks accept sample buffers in PTS order and own them once enqueued. The
/// driver never blocks inside a sink call; readiness is polled.
pub trait SampleSink: Send + Sync + 'static {
	/// Whether the sink wants another buffer right now.
	fn is_ready_for_more(&self) -> bool;

	/// Hand a buffer to the sink. Ownership transfers to the sink.
	fn enqueue(&self, buffer: SampleBuffer);

	/// Drop everything queued but not yet rendered.
	fn flush(&self);

	/// Volume control for audio sinks; video sinks may ignore it.
	fn set_volume(&self, _gain: f32) {}
}

/// Playback health of one render driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
	Playing,
	Waiting,
	Finished,
}

/// Called when a waiting interval closes, with its wall-clock duration.
pub type WaitingCallback = Box<dyn Fn(Duration) + Send + Sync>;

/// Pumps a [`RenderQueue`] into a [`SampleSink`] on the shared clock.
///
/// The pump pulls while the sink signals readiness and reports status
/// transitions through a watch channel, deduplicated so observers only see
/// changes. Starvation opens a waiting interval; the interval's duration is
/// reported when the next frame arrives, which is what drives the player's
/// adaptive downshift.
pub struct RenderDriver {
	queue: Arc<RenderQueue>,
	sink: Arc<dyn SampleSink>,
	status: watch::Receiver<DriverStatus>,
	task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RenderDriver {
	/// Spawn the pump for `queue` into `sink`, pulling against `clock`.
	pub fn start(
		queue: Arc<RenderQueue>,
		sink: Arc<dyn SampleSink>,
		clock: PlaybackClock,
		on_waiting: Option<WaitingCallback>,
	) -> Self {
		let (status_tx, status) = watch::channel(DriverStatus::Waiting);

		let task = tokio::spawn(pump(queue.clone(), sink.clone(), clock, status_tx, on_waiting));

		Self {
			queue,
			sink,
			status,
			task: std::sync::Mutex::new(Some(task)),
		}
	}

	/// Observe status transitions.
	pub fn status(&self) -> watch::Receiver<DriverStatus> {
		self.status.clone()
	}

	pub fn queue(&self) -> &Arc<RenderQueue> {
		&self.queue
	}

	/// Mark the queue complete without disturbing playback; the driver
	/// finishes once the queue drains.
	pub fn complete(&self) {
		self.queue.complete();
	}

	/// Stop pulling, flush the sink, and complete the queue. Buffers already
	/// handed to the sink stay with the sink.
	pub fn stop(&self) {
		self.queue.complete();
		if let Some(task) = self.task.lock().unwrap().take() {
			task.abort();
		}
		self.sink.flush();
	}
}

impl Drop for RenderDriver {
	fn drop(&mut self) {
		if let Some(task) = self.task.lock().unwrap().take() {
			task.abort();
		}
	}
}

async fn pump(
	queue: Arc<RenderQueue>,
	sink: Arc<dyn SampleSink>,
	clock: PlaybackClock,
	status: watch::Sender<DriverStatus>,
	on_waiting: Option<WaitingCallback>,
) {
	let mut waiting_since: Option<Instant> = None;

	loop {
		if !sink.is_ready_for_more() {
			sleep(POLL_BACKOFF).await;
			continue;
		}

		match queue.dequeue(clock.now()).await {
			Dequeue::Finished => {
				transition(&status, DriverStatus::Finished);
				debug!("render queue drained, driver finished");
				return;
			}
			Dequeue::Frame(buffer) => {
				if let Some(started) = waiting_since.take() {
					if let Some(on_waiting) = &on_waiting {
						on_waiting(started.elapsed());
					}
				}
				transition(&status, DriverStatus::Playing);
				sink.enqueue(buffer);
			}
			Dequeue::Skip => continue,
			Dequeue::Waiting => {
				transition(&status, DriverStatus::Waiting);
				waiting_since.get_or_insert_with(Instant::now);
				sleep(POLL_BACKOFF).await;
			}
		}
	}
}

/// Send only on change so observers see transitions, not every poll.
fn transition(status: &watch::Sender<DriverStatus>, next: DriverStatus) {
	status.send_if_modified(|current| {
		if *current == next {
			return false;
		}
		*current = next;
		true
	});
}

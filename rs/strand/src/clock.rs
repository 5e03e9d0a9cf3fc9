//! The shared presentation clock.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::Timestamp;

/// The presentation timebase shared by the video and audio render drivers.
///
/// Starts paused at zero. While running it advances with wall time scaled by
/// the playback rate; seeks rewrite the base time without disturbing rate or
/// run state. Clones share the same underlying clock.
#[derive(Clone)]
pub struct PlaybackClock {
	state: Arc<Mutex<ClockState>>,
}

struct ClockState {
	/// Presentation time accumulated up to `origin`.
	base: Timestamp,

	/// When the clock last started running, `None` while paused.
	origin: Option<Instant>,

	rate: f64,
}

impl PlaybackClock {
	pub fn new() -> Self {
		Self {
			state: Arc::new(Mutex::new(ClockState {
				base: Timestamp::ZERO,
				origin: None,
				rate: 1.0,
			})),
		}
	}

	/// The current presentation time.
	pub fn now(&self) -> Timestamp {
		let state = self.state.lock().unwrap();
		state.now()
	}

	pub fn is_running(&self) -> bool {
		self.state.lock().unwrap().origin.is_some()
	}

	pub fn pause(&self) {
		let mut state = self.state.lock().unwrap();
		state.base = state.now();
		state.origin = None;
	}

	pub fn resume(&self) {
		let mut state = self.state.lock().unwrap();
		if state.origin.is_none() {
			state.origin = Some(Instant::now());
		}
	}

	/// Jump to a new presentation time, preserving rate and run state.
	pub fn set_time(&self, time: Timestamp) {
		let mut state = self.state.lock().unwrap();
		state.base = time;
		if state.origin.is_some() {
			state.origin = Some(Instant::now());
		}
	}

	pub fn rate(&self) -> f64 {
		self.state.lock().unwrap().rate
	}

	/// Change the playback rate, folding elapsed time into the base first.
	pub fn set_rate(&self, rate: f64) {
		let mut state = self.state.lock().unwrap();
		state.base = state.now();
		if state.origin.is_some() {
			state.origin = Some(Instant::now());
		}
		state.rate = rate.max(0.0);
	}
}

impl Default for PlaybackClock {
	fn default() -> Self {
		Self::new()
	}
}

impl ClockState {
	fn now(&self) -> Timestamp {
		match self.origin {
			Some(origin) => {
				let elapsed = (origin.elapsed().as_micros() as f64 * self.rate) as u64;
				self.base + Timestamp::from_micros(elapsed)
			}
			None => self.base,
		}
	}
}

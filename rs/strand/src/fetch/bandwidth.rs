use std::sync::Mutex;
use std::time::Duration;

/// How many samples the window holds before it is consolidated.
const WINDOW_LIMIT: usize = 20;

/// Estimates are withheld until this many samples have been observed.
const MIN_SAMPLES: u64 = 4;

/// Rolling average of observed download bandwidth in bits per second.
///
/// Shared across every fetcher in the process. When the sample window fills
/// it collapses to a single entry holding the running mean; the loss of
/// variance is deliberate, favoring a stable estimate over a twitchy one.
#[derive(Default)]
pub struct BandwidthMeter {
	state: Mutex<MeterState>,
}

#[derive(Default)]
struct MeterState {
	window: Vec<u64>,
	observed: u64,
}

impl BandwidthMeter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record one transfer. Zero-duration and zero-byte transfers are ignored.
	pub fn add(&self, elapsed: Duration, bytes: usize) {
		if elapsed.is_zero() || bytes == 0 {
			return;
		}

		let bits_per_second = (bytes as f64 * 8.0 / elapsed.as_secs_f64()) as u64;

		let mut state = self.state.lock().unwrap();
		state.window.push(bits_per_second);
		state.observed += 1;

		if state.window.len() >= WINDOW_LIMIT {
			let mean = state.window.iter().sum::<u64>() / state.window.len() as u64;
			state.window.clear();
			state.window.push(mean);
		}
	}

	/// The current estimate in bits per second, or `None` until enough
	/// samples have been observed.
	pub fn estimate(&self) -> Option<u64> {
		let state = self.state.lock().unwrap();
		if state.observed < MIN_SAMPLES || state.window.is_empty() {
			return None;
		}

		Some(state.window.iter().sum::<u64>() / state.window.len() as u64)
	}
}

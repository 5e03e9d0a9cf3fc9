use std::time::Duration;

/// A timestamp representing the presentation time of a sample in microseconds.
///
/// Media tracks carry timestamps in their own timescale; [`Timestamp::from_scale`]
/// and [`Timestamp::to_scale`] convert between a track timescale and the unified
/// microsecond timeline.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
	/// The zero timestamp.
	pub const ZERO: Self = Self(0);

	pub const fn from_micros(micros: u64) -> Self {
		Self(micros)
	}

	pub const fn from_millis(millis: u64) -> Self {
		Self(millis * 1000)
	}

	pub const fn from_secs(seconds: u64) -> Self {
		Self(seconds * 1_000_000)
	}

	/// Convert a value in `timescale` units per second to a timestamp.
	pub const fn from_scale(value: u64, timescale: u64) -> Self {
		Self((value as u128 * 1_000_000 / timescale as u128) as u64)
	}

	/// Convert this timestamp into `timescale` units per second.
	pub const fn to_scale(self, timescale: u64) -> u64 {
		(self.0 as u128 * timescale as u128 / 1_000_000) as u64
	}

	/// Get the timestamp as microseconds.
	pub const fn as_micros(self) -> u64 {
		self.0
	}

	/// Get the timestamp as (truncated) seconds.
	pub const fn as_secs(self) -> u64 {
		self.0 / 1_000_000
	}

	pub fn as_secs_f64(self) -> f64 {
		self.0 as f64 / 1_000_000.0
	}

	/// Get the maximum of two timestamps.
	pub fn max(self, other: Self) -> Self {
		Self(self.0.max(other.0))
	}

	pub fn checked_sub(self, rhs: Self) -> Option<Self> {
		self.0.checked_sub(rhs.0).map(Self)
	}

	pub fn saturating_sub(self, rhs: Self) -> Self {
		Self(self.0.saturating_sub(rhs.0))
	}
}

impl From<Duration> for Timestamp {
	fn from(duration: Duration) -> Self {
		Self(duration.as_micros() as u64)
	}
}

impl From<Timestamp> for Duration {
	fn from(timestamp: Timestamp) -> Self {
		Duration::from_micros(timestamp.0)
	}
}

impl std::fmt::Debug for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}µs", self.0)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}µs", self.0)
	}
}

impl std::ops::Add for Timestamp {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self(self.0 + rhs.0)
	}
}

impl std::ops::AddAssign for Timestamp {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

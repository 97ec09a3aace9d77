//! Common types used throughout the Reservo platform.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

// Timestamp //
//***********//

/// Unix timestamp in seconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
	/// The current time
	pub fn now() -> Self {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(res.as_secs() as i64)
	}

	/// The current time shifted by `secs` seconds (may be negative)
	pub fn from_now(secs: i64) -> Self {
		Timestamp(Self::now().0 + secs)
	}

	/// Seconds elapsed since `earlier` (zero if `earlier` is in the future)
	pub fn secs_since(&self, earlier: Timestamp) -> i64 {
		(self.0 - earlier.0).max(0)
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::cmp::PartialEq for Timestamp {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl std::cmp::Eq for Timestamp {}

impl std::cmp::PartialOrd for Timestamp {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl std::cmp::Ord for Timestamp {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.0.cmp(&other.0)
	}
}

impl std::ops::Add<Duration> for Timestamp {
	type Output = Timestamp;

	fn add(self, rhs: Duration) -> Timestamp {
		Timestamp(self.0 + rhs.as_secs() as i64)
	}
}

impl std::ops::Sub<Duration> for Timestamp {
	type Output = Timestamp;

	fn sub(self, rhs: Duration) -> Timestamp {
		Timestamp(self.0 - rhs.as_secs() as i64)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timestamp_arithmetic() {
		let ts = Timestamp(1000);
		assert_eq!(ts + Duration::from_secs(500), Timestamp(1500));
		assert_eq!(ts - Duration::from_secs(500), Timestamp(500));
		assert_eq!(Timestamp(1500).secs_since(ts), 500);
		assert_eq!(ts.secs_since(Timestamp(1500)), 0);
	}

	#[test]
	fn test_timestamp_ordering() {
		assert!(Timestamp(1) < Timestamp(2));
		assert_eq!(Timestamp(5), Timestamp(5));
	}
}

// vim: ts=4

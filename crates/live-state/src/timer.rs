use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("unknown time format: {0}")]
pub struct TimeFormatParseError(pub String);

/// Display format for timer faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFormat {
	#[serde(rename = "SS")]
	Seconds,

	#[default]
	#[serde(rename = "MM:SS")]
	MinutesSeconds,

	#[serde(rename = "HH:MM:SS")]
	HoursMinutesSeconds,
}

impl TimeFormat {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Seconds => "SS",
			Self::MinutesSeconds => "MM:SS",
			Self::HoursMinutesSeconds => "HH:MM:SS",
		}
	}

	/// Render an elapsed duration in this format, every component
	/// zero-padded to width 2. `SS` shows the seconds component of the
	/// current minute, not total seconds.
	pub fn render(self, elapsed_seconds: f64) -> String {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let total = elapsed_seconds.max(0.0) as u64;

		match self {
			Self::Seconds => format!("{:02}", total % 60),
			Self::MinutesSeconds => format!("{:02}:{:02}", total / 60, total % 60),
			Self::HoursMinutesSeconds => {
				format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
			}
		}
	}
}

impl fmt::Display for TimeFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TimeFormat {
	type Err = TimeFormatParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"SS" => Ok(Self::Seconds),
			"MM:SS" => Ok(Self::MinutesSeconds),
			"HH:MM:SS" => Ok(Self::HoursMinutesSeconds),
			other => Err(TimeFormatParseError(other.to_owned())),
		}
	}
}

/// Stored record for one timer object.
///
/// `elapsed` accumulates runtime across prior stopped intervals; while
/// running, the live value is `elapsed + (now - start_time)`. A record with
/// `is_running = false` and `start_time = 0` is the reset state and must
/// never be projected against `start_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerRecord {
	pub is_running: bool,
	pub start_time: f64,
	pub elapsed: f64,
	pub time_format: TimeFormat,
}

impl TimerRecord {
	pub const fn reset(time_format: TimeFormat) -> Self {
		Self {
			is_running: false,
			start_time: 0.0,
			elapsed: 0.0,
			time_format,
		}
	}

	/// Elapsed time as observed at `now`, without advancing `start_time`
	pub fn projected_elapsed(&self, now: f64) -> f64 {
		if self.is_running {
			self.elapsed + (now - self.start_time)
		} else {
			self.elapsed
		}
	}
}

/// Read-side projection handed to callers and serialized into responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerState {
	pub is_running: bool,
	pub elapsed: f64,
	pub current_time: String,
	pub time_format: TimeFormat,
}

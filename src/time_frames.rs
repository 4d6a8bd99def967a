use std::{fmt::Display, str::FromStr};

use chrono::Duration;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The windows the dashboard can ask burn stats for. Each one fixes a lookback window, a bucket
/// width for the burn-over-time series, and how many buckets that series holds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Sequence, Serialize, Deserialize)]
pub enum TimeFrame {
    #[serde(rename = "day")]
    Day1,
    #[serde(rename = "week")]
    Day7,
    #[serde(rename = "month")]
    Day30,
}

use TimeFrame::*;

#[derive(Debug, Error)]
pub enum ParseTimeFrameError {
    #[error("failed to parse time frame {0}")]
    UnknownTimeFrame(String),
}

impl FromStr for TimeFrame {
    type Err = ParseTimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "d1" => Ok(Day1),
            "week" | "d7" => Ok(Day7),
            "month" | "d30" => Ok(Day30),
            unknown_time_frame => Err(ParseTimeFrameError::UnknownTimeFrame(
                unknown_time_frame.to_string(),
            )),
        }
    }
}

impl Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Day1 => write!(f, "d1"),
            Day7 => write!(f, "d7"),
            Day30 => write!(f, "d30"),
        }
    }
}

impl TimeFrame {
    /// How far back the transaction fetch reaches.
    pub fn duration(&self) -> Duration {
        match self {
            Day1 => Duration::days(1),
            Day7 => Duration::days(7),
            Day30 => Duration::days(30),
        }
    }

    /// Width of one bucket in the burn-over-time series.
    pub fn bucket_unit(&self) -> Duration {
        match self {
            Day1 => Duration::hours(1),
            Day7 | Day30 => Duration::days(1),
        }
    }

    pub fn bucket_count(&self) -> usize {
        match self {
            Day1 => 24,
            Day7 => 7,
            Day30 => 30,
        }
    }
}

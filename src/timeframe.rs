use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Bar granularity families, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Where a calendar bar is stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
    Weekday(Weekday),
}

impl Anchor {
    fn rank(self) -> u32 {
        match self {
            Anchor::Start => 0,
            Anchor::End => 1,
            Anchor::Weekday(day) => 2 + day.num_days_from_monday(),
        }
    }
}

/// Operating granularity of a transform.
///
/// Ordered so that coarser (lower-frequency) timeframes compare greater:
/// the unit decides first, then the interval. `60Min < 1H` and `365D < 1YE`
/// even though they span the same wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    unit: TimeUnit,
    interval: u32,
    anchor: Option<Anchor>,
}

impl TimeFrame {
    fn new(unit: TimeUnit, interval: u32, anchor: Option<Anchor>) -> Self {
        Self {
            unit,
            interval: interval.max(1),
            anchor,
        }
    }

    pub fn minutes(n: u32) -> Self {
        Self::new(TimeUnit::Minute, n, None)
    }

    pub fn hours(n: u32) -> Self {
        Self::new(TimeUnit::Hour, n, None)
    }

    pub fn days(n: u32) -> Self {
        Self::new(TimeUnit::Day, n, None)
    }

    pub fn weeks(n: u32, weekday: Option<Weekday>) -> Self {
        Self::new(TimeUnit::Week, n, weekday.map(Anchor::Weekday))
    }

    pub fn month_end(n: u32) -> Self {
        Self::new(TimeUnit::Month, n, Some(Anchor::End))
    }

    pub fn month_start(n: u32) -> Self {
        Self::new(TimeUnit::Month, n, Some(Anchor::Start))
    }

    pub fn quarter_end(n: u32) -> Self {
        Self::new(TimeUnit::Quarter, n, Some(Anchor::End))
    }

    pub fn quarter_start(n: u32) -> Self {
        Self::new(TimeUnit::Quarter, n, Some(Anchor::Start))
    }

    pub fn year_end(n: u32) -> Self {
        Self::new(TimeUnit::Year, n, Some(Anchor::End))
    }

    pub fn year_start(n: u32) -> Self {
        Self::new(TimeUnit::Year, n, Some(Anchor::Start))
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self.unit, TimeUnit::Minute | TimeUnit::Hour)
    }

    /// Approximate bar length. Calendar units use 30/91/365-day months,
    /// quarters and years.
    pub fn nominal_duration(&self) -> Duration {
        let n = i64::from(self.interval);
        match self.unit {
            TimeUnit::Minute => Duration::minutes(n),
            TimeUnit::Hour => Duration::hours(n),
            TimeUnit::Day => Duration::days(n),
            TimeUnit::Week => Duration::weeks(n),
            TimeUnit::Month => Duration::days(30 * n),
            TimeUnit::Quarter => Duration::days(91 * n),
            TimeUnit::Year => Duration::days(365 * n),
        }
    }
}

impl Ord for TimeFrame {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unit
            .cmp(&other.unit)
            .then(self.interval.cmp(&other.interval))
            .then_with(|| {
                self.anchor
                    .map(Anchor::rank)
                    .cmp(&other.anchor.map(Anchor::rank))
            })
    }
}

impl PartialOrd for TimeFrame {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for TimeFrame {
    type Err = GraphError;

    /// Accepts pandas-style offsets: `5Min`, `15T`, `1H`, `1D`, `1W-FRI`,
    /// `1ME`, `1MS`, `1QE`, `1YS`, ... Units are case-insensitive and the
    /// interval defaults to 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidTimeFrame(s.to_string());
        let text = s.trim();

        let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
        let interval = if digits == 0 {
            1
        } else {
            text[..digits].parse::<u32>().map_err(|_| invalid())?
        };
        if interval == 0 {
            return Err(invalid());
        }

        let rest = &text[digits..];
        let (unit, anchor) = match rest.split_once('-') {
            Some((unit, anchor)) => (unit, Some(anchor)),
            None => (rest, None),
        };
        if unit.is_empty() {
            return Err(invalid());
        }

        let unit = unit.to_ascii_lowercase();
        let timeframe = match (unit.as_str(), anchor) {
            ("w", Some(day)) => {
                let weekday = Weekday::from_str(day).map_err(|_| invalid())?;
                Self::weeks(interval, Some(weekday))
            }
            ("w", None) => Self::weeks(interval, None),
            (_, Some(_)) => return Err(invalid()),
            ("min" | "t", None) => Self::minutes(interval),
            ("h", None) => Self::hours(interval),
            ("d", None) => Self::days(interval),
            ("me" | "m", None) => Self::month_end(interval),
            ("ms", None) => Self::month_start(interval),
            ("qe" | "q", None) => Self::quarter_end(interval),
            ("qs", None) => Self::quarter_start(interval),
            ("ye" | "y" | "a", None) => Self::year_end(interval),
            ("ys" | "as", None) => Self::year_start(interval),
            _ => return Err(invalid()),
        };
        Ok(timeframe)
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = GraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(value: TimeFrame) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.interval;
        let edge = |anchor: Option<Anchor>| match anchor {
            Some(Anchor::Start) => "S",
            _ => "E",
        };
        match self.unit {
            TimeUnit::Minute => write!(f, "{n}Min"),
            TimeUnit::Hour => write!(f, "{n}H"),
            TimeUnit::Day => write!(f, "{n}D"),
            TimeUnit::Week => match self.anchor {
                Some(Anchor::Weekday(day)) => {
                    write!(f, "{n}W-{}", day.to_string().to_ascii_uppercase())
                }
                _ => write!(f, "{n}W"),
            },
            TimeUnit::Month => write!(f, "{n}M{}", edge(self.anchor)),
            TimeUnit::Quarter => write!(f, "{n}Q{}", edge(self.anchor)),
            TimeUnit::Year => write!(f, "{n}Y{}", edge(self.anchor)),
        }
    }
}

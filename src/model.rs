use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub const MINUTE: Ms = 60_000;
pub const HOUR: Ms = 60 * MINUTE;

/// A car in the fleet. Two cars are equal iff id, make and model all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub make: String,
    pub model: String,
}

impl Car {
    pub fn new(id: impl Into<String>, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            make: make.into(),
            model: model.into(),
        }
    }
}

/// A requested or reserved interval `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Ms,
    pub duration: Ms,
}

impl TimeWindow {
    pub fn new(start: Ms, duration: Ms) -> Self {
        Self { start, duration }
    }

    /// Saturates instead of overflowing for out-of-range input.
    pub fn end(&self) -> Ms {
        self.start.saturating_add(self.duration)
    }

    pub fn overlaps(&self, other: &TimeWindow, policy: BoundaryPolicy) -> bool {
        match policy {
            BoundaryPolicy::HalfOpen => self.start < other.end() && other.start < self.end(),
            BoundaryPolicy::Closed => self.start <= other.end() && other.start <= self.end(),
        }
    }

    /// True while the window has not finished at `now` (ongoing or upcoming).
    pub fn ends_after(&self, now: Ms) -> bool {
        self.end() > now
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end()
    }
}

/// How touching endpoints are treated when two windows are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// `[a, b)` and `[b, c)` do not conflict; back-to-back bookings are fine.
    #[default]
    HalfOpen,
    /// Windows sharing an endpoint conflict; back-to-back bookings are rejected.
    Closed,
}

impl BoundaryPolicy {
    /// Could an entry starting at `start` still overlap a query ending at `query_end`?
    /// Used to bound the search over a start-ordered ledger.
    pub(crate) fn may_overlap(self, start: Ms, query_end: Ms) -> bool {
        match self {
            BoundaryPolicy::HalfOpen => start < query_end,
            BoundaryPolicy::Closed => start <= query_end,
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::HalfOpen => write!(f, "half-open"),
            BoundaryPolicy::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "half-open" | "half_open" | "halfopen" => Ok(BoundaryPolicy::HalfOpen),
            "closed" => Ok(BoundaryPolicy::Closed),
            other => Err(format!("unknown boundary policy: {other} (expected half-open or closed)")),
        }
    }
}

/// An accepted reservation. The car is a snapshot taken at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub window: TimeWindow,
    pub car: Car,
}

impl Reservation {
    pub fn new(window: TimeWindow, car: Car) -> Self {
        Self { window, car }
    }
}

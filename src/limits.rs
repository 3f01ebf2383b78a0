use crate::model::{HOUR, MINUTE, Ms};

/// Shortest reservation accepted.
pub const MIN_DURATION_MS: Ms = 5 * MINUTE;
/// Longest reservation accepted.
pub const MAX_DURATION_MS: Ms = 2 * HOUR;

/// A reservation must start at least this far ahead of now.
pub const MIN_LEAD_MS: Ms = 5 * MINUTE;
/// ...and at most this far. Only the start is bounded.
pub const MAX_LEAD_MS: Ms = 24 * HOUR;

pub const MAX_CARS: usize = 10_000;
pub const MAX_FIELD_LEN: usize = 128;

mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use availability::{allocate, available_cars, conflicting_cars};
pub use conflict::{has_upcoming_or_ongoing, validate_window};
pub use error::{
    EngineError, ErrorKind, ValidationError, CAR_RESERVED, DURATION_INVALID, NO_CARS_AVAILABLE,
    TIME_INVALID,
};
pub use store::{CarRegistry, FleetState, ReservationLedger};

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::model::*;

/// The reservation store: car registry plus ledger behind a single lock.
///
/// Every write (car mutation or reservation) holds the write lock across its
/// whole check-then-act sequence, so two requests can never both win the same
/// car for overlapping windows. Reads share the lock and return owned copies.
pub struct Engine {
    pub(super) state: RwLock<FleetState>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) policy: BoundaryPolicy,
}

impl Engine {
    pub fn new(clock: Arc<dyn Clock>, policy: BoundaryPolicy) -> Self {
        Self {
            state: RwLock::new(FleetState::new()),
            clock,
            policy,
        }
    }

    /// Engine on wall-clock time with the default boundary policy.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock), BoundaryPolicy::default())
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    pub fn now(&self) -> Ms {
        self.clock.now_ms()
    }
}

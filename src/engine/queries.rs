use crate::model::*;

use super::availability::available_cars;
use super::conflict::{has_upcoming_or_ongoing, validate_window};
use super::{Engine, EngineError};

impl Engine {
    /// All cars in insertion order.
    pub async fn list_cars(&self) -> Vec<Car> {
        let guard = self.state.read().await;
        guard.registry.iter().cloned().collect()
    }

    pub async fn get_car(&self, id: &str) -> Option<Car> {
        let guard = self.state.read().await;
        guard.registry.get(id).cloned()
    }

    /// Reservations that have not yet ended, ordered by start.
    pub async fn list_reservations(&self) -> Vec<Reservation> {
        let now = self.clock.now_ms();
        let guard = self.state.read().await;
        guard.ledger.upcoming_or_ongoing(now).cloned().collect()
    }

    /// Upcoming or ongoing reservations of one car.
    pub async fn car_reservations(&self, car_id: &str) -> Vec<Reservation> {
        let now = self.clock.now_ms();
        let guard = self.state.read().await;
        guard
            .ledger
            .upcoming_or_ongoing(now)
            .filter(|r| r.car.id == car_id)
            .cloned()
            .collect()
    }

    pub async fn has_upcoming_or_ongoing(&self, car_id: &str) -> bool {
        let now = self.clock.now_ms();
        let guard = self.state.read().await;
        has_upcoming_or_ongoing(&guard.ledger, car_id, now)
    }

    /// Cars that could serve `window` right now. Nothing is committed.
    /// The window is validated the same way `reserve_car` validates it.
    pub async fn available_cars(&self, window: &TimeWindow) -> Result<Vec<Car>, EngineError> {
        validate_window(window, self.clock.now_ms())?;
        let guard = self.state.read().await;
        Ok(available_cars(&guard.registry, &guard.ledger, window, self.policy)
            .into_iter()
            .cloned()
            .collect())
    }
}

use tracing::{debug, info, warn};

use crate::limits::*;
use crate::model::*;

use super::availability::allocate;
use super::conflict::{check_car_free, validate_car_fields, validate_make_model, validate_window};
use super::{Engine, EngineError};

impl Engine {
    pub async fn add_car(&self, car: Car) -> Result<(), EngineError> {
        validate_car_fields(&car)?;
        let mut guard = self.state.write().await;
        if guard.registry.len() >= MAX_CARS {
            return Err(EngineError::LimitExceeded("too many cars"));
        }
        let id = car.id.clone();
        if !guard.registry.add(car) {
            debug!(car_id = %id, "duplicate car rejected");
            return Err(EngineError::AlreadyExists(id));
        }
        metrics::gauge!(crate::observability::CARS_REGISTERED).set(guard.registry.len() as f64);
        info!(car_id = %id, "car added");
        Ok(())
    }

    pub async fn update_car(&self, id: &str, make: String, model: String) -> Result<(), EngineError> {
        validate_make_model(&make, &model)?;
        let mut guard = self.state.write().await;
        if !guard.registry.contains(id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        if let Err(e) = check_car_free(&guard.ledger, id, self.clock.now_ms()) {
            warn!(car_id = %id, "update refused: car has upcoming or ongoing reservation");
            return Err(e);
        }
        let car = guard
            .registry
            .get_mut(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        car.make = make;
        car.model = model;
        info!(car_id = %id, "car updated");
        Ok(())
    }

    pub async fn remove_car(&self, id: &str) -> Result<Car, EngineError> {
        let mut guard = self.state.write().await;
        if !guard.registry.contains(id) {
            return Err(EngineError::NotFound(id.to_string()));
        }
        if let Err(e) = check_car_free(&guard.ledger, id, self.clock.now_ms()) {
            warn!(car_id = %id, "removal refused: car has upcoming or ongoing reservation");
            return Err(e);
        }
        let removed = guard
            .registry
            .remove(id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        metrics::gauge!(crate::observability::CARS_REGISTERED).set(guard.registry.len() as f64);
        info!(car_id = %id, "car removed");
        Ok(removed)
    }

    /// Validate, pick a free car and commit the reservation in one step.
    pub async fn reserve_car(&self, window: TimeWindow) -> Result<Reservation, EngineError> {
        let now = self.clock.now_ms();
        if let Err(e) = validate_window(&window, now) {
            debug!(start = window.start, duration = window.duration, "reservation rejected: {e}");
            metrics::counter!(crate::observability::RESERVATIONS_TOTAL, "outcome" => "invalid")
                .increment(1);
            return Err(e.into());
        }

        let mut guard = self.state.write().await;
        let car = match allocate(&guard.registry, &guard.ledger, &window, self.policy) {
            Some(car) => car.clone(),
            None => {
                debug!(
                    start = window.start,
                    duration = window.duration,
                    cars = guard.registry.len(),
                    "reservation rejected: no car available"
                );
                metrics::counter!(crate::observability::RESERVATIONS_TOTAL, "outcome" => "unavailable")
                    .increment(1);
                return Err(EngineError::NoCarsAvailable);
            }
        };

        let reservation = Reservation::new(window, car);
        guard.ledger.add(reservation.clone());
        drop(guard);

        metrics::counter!(crate::observability::RESERVATIONS_TOTAL, "outcome" => "accepted")
            .increment(1);
        info!(
            car_id = %reservation.car.id,
            start = window.start,
            end = window.end(),
            "reservation accepted"
        );
        Ok(reservation)
    }
}

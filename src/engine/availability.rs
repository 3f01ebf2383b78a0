use std::collections::HashSet;

use crate::model::*;

use super::store::{CarRegistry, ReservationLedger};

// ── Allocation Algorithm ──────────────────────────────────────────

/// Cars holding any reservation (past or future) that conflicts with `request`.
pub fn conflicting_cars<'a>(
    ledger: &'a ReservationLedger,
    request: &TimeWindow,
    policy: BoundaryPolicy,
) -> HashSet<&'a Car> {
    ledger
        .overlapping(request, policy)
        .map(|r| &r.car)
        .collect()
}

/// Registry cars with no conflicting reservation, in registry order.
///
/// Cars are compared by value (id, make and model) against the snapshots
/// stored in the ledger.
pub fn available_cars<'a>(
    registry: &'a CarRegistry,
    ledger: &ReservationLedger,
    request: &TimeWindow,
    policy: BoundaryPolicy,
) -> Vec<&'a Car> {
    if registry.is_empty() {
        return Vec::new();
    }
    let taken = conflicting_cars(ledger, request, policy);
    registry.iter().filter(|car| !taken.contains(car)).collect()
}

/// Pick the first free car for `request`, or `None` when every car is taken.
/// Deterministic for a given registry and ledger.
pub fn allocate<'a>(
    registry: &'a CarRegistry,
    ledger: &ReservationLedger,
    request: &TimeWindow,
    policy: BoundaryPolicy,
) -> Option<&'a Car> {
    if registry.is_empty() {
        return None;
    }
    let taken = conflicting_cars(ledger, request, policy);
    registry.iter().find(|car| !taken.contains(car))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet(ids: &[&str]) -> CarRegistry {
        let mut reg = CarRegistry::new();
        for id in ids {
            reg.add(Car::new(*id, "Make", format!("Model-{id}")));
        }
        reg
    }

    fn book(ledger: &mut ReservationLedger, reg: &CarRegistry, id: &str, start: Ms, duration: Ms) {
        let car = reg.get(id).unwrap().clone();
        ledger.add(Reservation::new(TimeWindow::new(start, duration), car));
    }

    #[test]
    fn empty_registry_allocates_nothing() {
        let reg = CarRegistry::new();
        let ledger = ReservationLedger::new();
        let w = TimeWindow::new(HOUR, HOUR);
        assert!(allocate(&reg, &ledger, &w, BoundaryPolicy::HalfOpen).is_none());
        assert!(available_cars(&reg, &ledger, &w, BoundaryPolicy::HalfOpen).is_empty());
    }

    #[test]
    fn first_car_in_registry_order_wins() {
        let reg = fleet(&["C1", "C2", "C3"]);
        let ledger = ReservationLedger::new();
        let w = TimeWindow::new(HOUR, HOUR);
        assert_eq!(allocate(&reg, &ledger, &w, BoundaryPolicy::HalfOpen).unwrap().id, "C1");
    }

    #[test]
    fn conflicting_cars_are_skipped() {
        let reg = fleet(&["C1", "C2", "C3"]);
        let mut ledger = ReservationLedger::new();
        book(&mut ledger, &reg, "C1", HOUR, HOUR);
        book(&mut ledger, &reg, "C2", 90 * MINUTE, HOUR);

        let w = TimeWindow::new(HOUR + 30 * MINUTE, 30 * MINUTE);
        assert_eq!(allocate(&reg, &ledger, &w, BoundaryPolicy::HalfOpen).unwrap().id, "C3");
        let free: Vec<_> = available_cars(&reg, &ledger, &w, BoundaryPolicy::HalfOpen)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(free, vec!["C3"]);
    }

    #[test]
    fn any_overlapping_reservation_excludes_the_car() {
        let reg = fleet(&["C1"]);
        let mut ledger = ReservationLedger::new();
        book(&mut ledger, &reg, "C1", 0, HOUR);
        book(&mut ledger, &reg, "C1", 5 * HOUR, HOUR);

        let hits_second = TimeWindow::new(5 * HOUR + 30 * MINUTE, HOUR);
        assert!(allocate(&reg, &ledger, &hits_second, BoundaryPolicy::HalfOpen).is_none());
        let between = TimeWindow::new(2 * HOUR, HOUR);
        assert!(allocate(&reg, &ledger, &between, BoundaryPolicy::HalfOpen).is_some());
    }

    #[test]
    fn identical_window_conflicts() {
        let reg = fleet(&["C1"]);
        let mut ledger = ReservationLedger::new();
        book(&mut ledger, &reg, "C1", HOUR, HOUR);
        let same = TimeWindow::new(HOUR, HOUR);
        for policy in [BoundaryPolicy::HalfOpen, BoundaryPolicy::Closed] {
            assert!(allocate(&reg, &ledger, &same, policy).is_none());
        }
    }

    #[test]
    fn back_to_back_follows_policy() {
        let reg = fleet(&["C1"]);
        let mut ledger = ReservationLedger::new();
        book(&mut ledger, &reg, "C1", HOUR, HOUR);
        let next = TimeWindow::new(2 * HOUR, HOUR);
        assert!(allocate(&reg, &ledger, &next, BoundaryPolicy::HalfOpen).is_some());
        assert!(allocate(&reg, &ledger, &next, BoundaryPolicy::Closed).is_none());
    }

    #[test]
    fn snapshot_with_stale_make_does_not_block() {
        // A reservation taken before a car was re-described no longer matches it by value.
        let mut reg = fleet(&["C1"]);
        let mut ledger = ReservationLedger::new();
        book(&mut ledger, &reg, "C1", HOUR, HOUR);
        reg.get_mut("C1").unwrap().make = "Other".into();
        let w = TimeWindow::new(HOUR, HOUR);
        assert_eq!(allocate(&reg, &ledger, &w, BoundaryPolicy::HalfOpen).unwrap().id, "C1");
    }
}

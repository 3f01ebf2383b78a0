use std::sync::Arc;

use proptest::prelude::*;

use carreserve::clock::ManualClock;
use carreserve::engine::Engine;
use carreserve::model::{BoundaryPolicy, Car, Ms, TimeWindow, HOUR, MINUTE};

const NOW: Ms = 1_700_000_000_000;

fn policy() -> impl Strategy<Value = BoundaryPolicy> {
    prop_oneof![Just(BoundaryPolicy::HalfOpen), Just(BoundaryPolicy::Closed)]
}

fn any_window() -> impl Strategy<Value = TimeWindow> {
    (-1_000i64..1_000, 0i64..500).prop_map(|(start, duration)| TimeWindow::new(start, duration))
}

/// Windows the validator accepts at `NOW`, on a minute grid so touching ends are common.
fn bookable_window() -> impl Strategy<Value = TimeWindow> {
    (5i64..=24 * 60, 5i64..=120)
        .prop_map(|(lead, minutes)| TimeWindow::new(NOW + lead * MINUTE, minutes * MINUTE))
}

fn fleet_engine(cars: usize, policy: BoundaryPolicy) -> (Arc<ManualClock>, Engine) {
    let clock = Arc::new(ManualClock::new(NOW));
    let engine = Engine::new(clock.clone(), policy);
    tokio_test::block_on(async {
        for i in 0..cars {
            engine
                .add_car(Car::new(format!("C{i}"), "Make", format!("Model {i}")))
                .await
                .unwrap();
        }
    });
    (clock, engine)
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in any_window(), b in any_window(), policy in policy()) {
        prop_assert_eq!(a.overlaps(&b, policy), b.overlaps(&a, policy));
    }

    #[test]
    fn window_overlaps_itself(start in -1_000i64..1_000, duration in 1i64..500, policy in policy()) {
        let w = TimeWindow::new(start, duration);
        prop_assert!(w.overlaps(&w, policy));
    }

    #[test]
    fn half_open_overlap_implies_closed_overlap(a in any_window(), b in any_window()) {
        if a.overlaps(&b, BoundaryPolicy::HalfOpen) {
            prop_assert!(a.overlaps(&b, BoundaryPolicy::Closed));
        }
    }

    #[test]
    fn committed_reservations_never_overlap_per_car(
        cars in 1usize..5,
        policy in policy(),
        requests in prop::collection::vec(bookable_window(), 1..40),
    ) {
        let (_, engine) = fleet_engine(cars, policy);
        let committed = tokio_test::block_on(async {
            for window in requests {
                let _ = engine.reserve_car(window).await;
            }
            engine.list_reservations().await
        });

        for (i, a) in committed.iter().enumerate() {
            for b in &committed[i + 1..] {
                if a.car == b.car {
                    prop_assert!(
                        !a.window.overlaps(&b.window, policy),
                        "{:?} and {:?} share {}", a.window, b.window, a.car.id
                    );
                }
            }
        }
    }

    #[test]
    fn allocation_is_deterministic(
        cars in 1usize..5,
        requests in prop::collection::vec(bookable_window(), 0..20),
        probe in bookable_window(),
    ) {
        let (_, engine) = fleet_engine(cars, BoundaryPolicy::default());
        let (first, second, reserved) = tokio_test::block_on(async {
            for window in requests {
                let _ = engine.reserve_car(window).await;
            }
            let first = engine.available_cars(&probe).await.unwrap();
            let second = engine.available_cars(&probe).await.unwrap();
            let reserved = engine.reserve_car(probe).await;
            (first, second, reserved)
        });

        prop_assert_eq!(&first, &second);
        match reserved {
            Ok(r) => prop_assert_eq!(Some(&r.car), first.first()),
            Err(_) => prop_assert!(first.is_empty()),
        }
    }

    #[test]
    fn guard_holds_until_reservation_ends(window in bookable_window(), offset in -HOUR..3 * HOUR) {
        let (clock, engine) = fleet_engine(1, BoundaryPolicy::default());
        let at = window.start + offset;
        let busy = tokio_test::block_on(async {
            engine.reserve_car(window).await.unwrap();
            clock.set(at);
            engine.has_upcoming_or_ongoing("C0").await
        });
        prop_assert_eq!(busy, at < window.end());
    }
}

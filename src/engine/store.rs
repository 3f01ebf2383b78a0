use crate::model::*;

/// Known cars, kept in insertion order. Ids are unique.
#[derive(Debug, Default)]
pub struct CarRegistry {
    cars: Vec<Car>,
}

impl CarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Car> {
        self.cars.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Car> {
        self.cars.iter_mut().find(|c| c.id == id)
    }

    /// Insert unless the id is taken. Returns whether the car was added.
    pub fn add(&mut self, car: Car) -> bool {
        if self.contains(&car.id) {
            return false;
        }
        self.cars.push(car);
        true
    }

    /// Remove by id, preserving the order of the remaining cars.
    pub fn remove(&mut self, id: &str) -> Option<Car> {
        let pos = self.position(id)?;
        Some(self.cars.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Car> {
        self.cars.iter()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.cars.iter().position(|c| c.id == id)
    }
}

/// Accepted reservations, sorted by `window.start`. Append-only.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    reservations: Vec<Reservation>,
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Insert maintaining sort order by start. No conflict checking here.
    pub fn add(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .partition_point(|r| r.window.start <= reservation.window.start);
        self.reservations.insert(pos, reservation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter()
    }

    /// Reservations whose window ends strictly after `now`.
    pub fn upcoming_or_ongoing(&self, now: Ms) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter().filter(move |r| r.window.ends_after(now))
    }

    /// Reservations conflicting with `query` under `policy`.
    /// Entries starting past the query end are skipped by binary search.
    pub fn overlapping(
        &self,
        query: &TimeWindow,
        policy: BoundaryPolicy,
    ) -> impl Iterator<Item = &Reservation> {
        let query = *query;
        let right_bound = self
            .reservations
            .partition_point(|r| policy.may_overlap(r.window.start, query.end()));
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.window.overlaps(&query, policy))
    }
}

/// Registry and ledger behind one lock, so allocation and mutation see
/// and change both together.
#[derive(Debug, Default)]
pub struct FleetState {
    pub registry: CarRegistry,
    pub ledger: ReservationLedger,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }
}

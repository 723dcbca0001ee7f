use std::collections::BTreeMap;

use crate::tour::Tour;
use crate::types::{Time, VertexId};

/// Vertices claimed by other agents at discrete global times, ordered by
/// time. A fresh table is supplied per solve; the planner never mutates it.
#[derive(Clone, Debug, Default)]
pub struct ReservationTable {
    by_time: BTreeMap<Time, Vec<VertexId>>,
    len: usize,
}

impl ReservationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, time: Time, vertex: VertexId) {
        self.by_time.entry(time).or_default().push(vertex);
        self.len += 1;
    }

    /// Claims every (time, vertex) step the tour occupies, starting at the
    /// tour's start time. This is how later agents see committed paths.
    pub fn commit_tour(&mut self, tour: &Tour) {
        for (step, vertex) in tour.steps().enumerate() {
            self.reserve(tour.start_time() + step as Time, vertex);
        }
    }

    #[inline]
    pub fn is_reserved(&self, time: Time, vertex: VertexId) -> bool {
        self.by_time
            .get(&time)
            .is_some_and(|vs| vs.contains(&vertex))
    }

    /// Reservation entries with `min <= time <= max`, ascending by time.
    pub fn window(&self, min: Time, max: Time) -> impl Iterator<Item = (Time, &[VertexId])> {
        self.by_time
            .range(min..=max)
            .map(|(&t, vs)| (t, vs.as_slice()))
    }

    /// Number of reserved (time, vertex) pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<(Time, VertexId)> for ReservationTable {
    fn from_iter<I: IntoIterator<Item = (Time, VertexId)>>(iter: I) -> Self {
        let mut table = ReservationTable::new();
        for (time, vertex) in iter {
            table.reserve(time, vertex);
        }
        table
    }
}

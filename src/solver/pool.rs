use crate::order::OrderExtents;
use crate::solver::gtsp::TourSolver;
use crate::types::Time;

/// Hands out one `TourSolver` per class count so a worker reuses the solver's
/// working arrays across the many orders of a planning run. Solvers are
/// created lazily, sized for the largest order the pool was dimensioned for,
/// and kept for the lifetime of the pool.
pub struct SolverPool {
    solvers: Vec<Option<TourSolver>>,
    max_candidates: usize,
    time_limit: Time,
}

impl SolverPool {
    pub fn new(max_classes: usize, max_candidates: usize, time_limit: Time) -> Self {
        SolverPool {
            solvers: (0..=max_classes).map(|_| None).collect(),
            max_candidates,
            time_limit,
        }
    }

    /// Dimensions the pool from a sizing scan over the order set, with the
    /// scan's suggested time limit.
    pub fn sized_for(extents: &OrderExtents) -> Self {
        Self::new(
            extents.max_classes,
            extents.max_candidates,
            extents.suggested_time_limit(),
        )
    }

    pub fn time_limit(&self) -> Time {
        self.time_limit
    }

    /// The solver for orders of `classes` item classes. Each solver resets
    /// its state on entry to `solve`, so a returned reference is ready to
    /// use as-is.
    pub fn solver(&mut self, classes: usize) -> &mut TourSolver {
        if self.solvers.len() <= classes {
            self.solvers.resize_with(classes + 1, || None);
        }
        let (max_candidates, time_limit) = (self.max_candidates, self.time_limit);
        self.solvers[classes]
            .get_or_insert_with(|| TourSolver::new(classes, max_candidates, time_limit))
    }

    /// Number of solvers built so far.
    pub fn built(&self) -> usize {
        self.solvers.iter().filter(|s| s.is_some()).count()
    }
}

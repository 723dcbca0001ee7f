use crate::types::{Time, VertexId};

/// One leg of a tour: dwell at `from`, then travel to `to` along a
/// time-indexed path (waits repeat their vertex).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TourLeg {
    pub from: VertexId,
    pub to: VertexId,
    pub dwell: Time,
    pub path: Vec<VertexId>,
}

/// Immutable result of a solve: the leg paths, the chosen pick vertex and
/// dwell per class, and the inclusive step count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tour {
    start_time: Time,
    segments: Vec<Vec<VertexId>>,
    pick_vertices: Vec<VertexId>,
    pick_times: Vec<Time>,
    length: Time,
}

impl Tour {
    /// Assembles a tour from consecutive legs, depot leg first. Adjacent
    /// legs share their junction vertex; dwells count into the length.
    pub fn from_legs(start_time: Time, legs: Vec<TourLeg>) -> Tour {
        debug_assert!(!legs.is_empty());
        let mut segments = Vec::with_capacity(legs.len());
        let mut pick_vertices = Vec::with_capacity(legs.len().saturating_sub(1));
        let mut pick_times = Vec::with_capacity(legs.len().saturating_sub(1));
        let mut length = legs[0].path.len() as Time - 1;
        for (i, leg) in legs.into_iter().enumerate() {
            debug_assert!(leg.path.first() == Some(&leg.from));
            debug_assert!(leg.path.last() == Some(&leg.to));
            if i > 0 {
                pick_vertices.push(leg.from);
                pick_times.push(leg.dwell);
                length += leg.dwell + leg.path.len() as Time - 1;
            }
            segments.push(leg.path);
        }
        length += 1;
        Tour {
            start_time,
            segments,
            pick_vertices,
            pick_times,
            length,
        }
    }

    /// Inclusive number of occupied time steps.
    #[inline(always)]
    pub fn length(&self) -> Time {
        self.length
    }

    /// Number of moves, one less than the step count.
    #[inline(always)]
    pub fn distance(&self) -> Time {
        self.length - 1
    }

    #[inline(always)]
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// Chosen pick vertex per class, in visit order.
    pub fn pick_vertices(&self) -> &[VertexId] {
        &self.pick_vertices
    }

    pub fn pick_times(&self) -> &[Time] {
        &self.pick_times
    }

    pub fn segments(&self) -> &[Vec<VertexId>] {
        &self.segments
    }

    /// Occupied vertex per time step, lazily: the first segment in full,
    /// each pick vertex repeated for its dwell, later segments skipping
    /// their duplicated junction vertex. Yields exactly `length` vertices.
    pub fn steps(&self) -> TourSteps<'_> {
        TourSteps {
            tour: self,
            pick_idx: 0,
            route_idx: 0,
            picking: false,
            current: 0,
        }
    }
}

pub struct TourSteps<'a> {
    tour: &'a Tour,
    pick_idx: usize,
    route_idx: usize,
    picking: bool,
    current: VertexId,
}

impl Iterator for TourSteps<'_> {
    type Item = VertexId;

    fn next(&mut self) -> Option<VertexId> {
        let tour = self.tour;
        if !self.picking && self.route_idx < tour.segments[self.pick_idx].len() {
            self.current = tour.segments[self.pick_idx][self.route_idx];
            self.route_idx += 1;
            Some(self.current)
        } else if !self.picking && self.pick_idx < tour.pick_vertices.len() {
            // arrival counts as the first dwell step
            self.route_idx = 1;
            self.picking = true;
            self.current = tour.pick_vertices[self.pick_idx];
            Some(self.current)
        } else if self.picking && (self.route_idx as Time) < tour.pick_times[self.pick_idx] {
            self.route_idx += 1;
            Some(self.current)
        } else if self.picking && self.pick_idx < tour.segments.len() - 1 {
            self.pick_idx += 1;
            if tour.segments[self.pick_idx].len() > 1 {
                self.picking = false;
                self.current = tour.segments[self.pick_idx][1];
                self.route_idx = 2;
            } else {
                // zero-move leg: the next pick shares this vertex and its
                // dwell continues from here
                self.route_idx = 1;
            }
            Some(self.current)
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a Tour {
    type Item = VertexId;
    type IntoIter = TourSteps<'a>;

    fn into_iter(self) -> TourSteps<'a> {
        self.steps()
    }
}

/// Total step count over any collection of tours.
pub fn sum_of_costs<'a, I>(tours: I) -> Time
where
    I: IntoIterator<Item = &'a Tour>,
{
    tours.into_iter().map(Tour::length).sum()
}

/// Largest per-agent total step count.
pub fn makespan<'a, I, J>(agents: I) -> Time
where
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = &'a Tour>,
{
    agents
        .into_iter()
        .map(|tours| tours.into_iter().map(Tour::length).sum())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: VertexId, to: VertexId, dwell: Time, path: &[VertexId]) -> TourLeg {
        TourLeg {
            from,
            to,
            dwell,
            path: path.to_vec(),
        }
    }

    #[test]
    fn length_counts_moves_dwells_and_the_starting_step() {
        let tour = Tour::from_legs(
            0,
            vec![leg(0, 1, 0, &[0, 1]), leg(1, 2, 2, &[1, 2])],
        );
        assert_eq!(tour.length(), 5);
        assert_eq!(tour.distance(), 4);
        assert_eq!(tour.pick_vertices(), &[1]);
        assert_eq!(tour.pick_times(), &[2]);
    }

    #[test]
    fn steps_repeat_dwells_and_skip_junctions() {
        let tour = Tour::from_legs(
            0,
            vec![leg(0, 1, 0, &[0, 1]), leg(1, 2, 2, &[1, 2])],
        );
        let steps: Vec<_> = tour.steps().collect();
        assert_eq!(steps, vec![0, 1, 1, 1, 2]);
        assert_eq!(steps.len() as Time, tour.length());
    }

    #[test]
    fn zero_move_leg_keeps_the_agent_in_place() {
        // two picks of different classes on the same vertex
        let tour = Tour::from_legs(
            0,
            vec![
                leg(0, 1, 0, &[0, 1]),
                leg(1, 1, 1, &[1]),
                leg(1, 2, 1, &[1, 2]),
            ],
        );
        assert_eq!(tour.length(), 5);
        let steps: Vec<_> = tour.steps().collect();
        assert_eq!(steps, vec![0, 1, 1, 1, 2]);
    }

    #[test]
    fn waits_inside_a_leg_path_are_yielded_in_place() {
        let tour = Tour::from_legs(
            0,
            vec![leg(0, 1, 0, &[0, 1]), leg(1, 3, 1, &[1, 1, 2, 3])],
        );
        assert_eq!(tour.length(), 6);
        let steps: Vec<_> = tour.steps().collect();
        assert_eq!(steps, vec![0, 1, 1, 1, 2, 3]);
    }

    #[test]
    fn single_leg_tour_is_just_its_path() {
        let tour = Tour::from_legs(0, vec![leg(0, 3, 0, &[0, 1, 2, 3])]);
        assert_eq!(tour.length(), 4);
        assert_eq!(tour.pick_vertices(), &[] as &[VertexId]);
        let steps: Vec<_> = tour.steps().collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
    }

    #[test]
    fn aggregates_over_tour_collections() {
        let a = Tour::from_legs(0, vec![leg(0, 1, 0, &[0, 1])]);
        let b = Tour::from_legs(0, vec![leg(0, 2, 0, &[0, 1, 2])]);
        assert_eq!(sum_of_costs([&a, &b]), 5);
        let agents = vec![vec![a], vec![b]];
        assert_eq!(makespan(&agents), 3);
        assert_eq!(sum_of_costs(agents.iter().flatten()), 5);
    }
}

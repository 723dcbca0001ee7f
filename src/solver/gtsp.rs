use std::time::Instant;

use log::{debug, warn};
use thiserror::Error;

use crate::graph::{ReservationTable, RouteGraph, SearchDir, SearchError, SearchScratch};
use crate::order::OrderInstance;
use crate::solver::bitset::{self, ClassSet};
use crate::stats::{SolveRecord, SolveStats};
use crate::tour::{Tour, TourLeg};
use crate::types::{ClassId, OrderId, Time, VertexId};
use crate::utils::{Matrix2, Matrix3};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("order {order}: no complete tour finishes within {time_limit} steps")]
    NoTourFound { order: OrderId, time_limit: Time },
    #[error("order {order}: backtracking stuck at time {time} with classes {remaining:?} unplaced")]
    BacktrackDeadEnd {
        order: OrderId,
        time: Time,
        remaining: Vec<ClassId>,
    },
}

/// Label-setting solver for one picking tour. Every candidate vertex gets a
/// row of reachability flags over discrete time, each flag carrying the set
/// of item classes collected by some walk arriving there at that time. Rows
/// are sized once from the largest expected order, so a solver instance is
/// reusable across solves without reallocating.
///
/// States merging into the same `(candidate, time)` cell are unioned rather
/// than kept apart, so a label may overstate what any single walk collected.
/// Backtracking compensates by re-verifying each leg against the cells it
/// claims to come from and stretching departure times when the claimed
/// predecessor is not actually reachable.
pub struct TourSolver {
    max_classes: usize,
    max_candidates: usize,
    time_limit: usize,
    reached: Matrix2<bool>,
    states: Matrix3<bitset::Word>,
    reverse_times: Vec<Time>,
    scratch: SearchScratch,
}

impl TourSolver {
    pub fn new(max_classes: usize, max_candidates: usize, time_limit: Time) -> Self {
        let steps = time_limit.max(1) as usize;
        TourSolver {
            max_classes,
            max_candidates,
            time_limit: steps,
            reached: Matrix2::new(max_candidates, steps, false),
            states: Matrix3::new(max_candidates, steps, bitset::words_for(max_classes), 0),
            reverse_times: vec![0; max_candidates],
            scratch: SearchScratch::new(0),
        }
    }

    pub fn time_limit(&self) -> Time {
        self.time_limit as Time
    }

    pub fn max_classes(&self) -> usize {
        self.max_classes
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    fn reset(&mut self) {
        self.reached.fill(false);
        self.states.fill(0);
    }

    /// Finds a shortest-duration tour that leaves `order.start` at `offset`,
    /// picks one candidate of every class and ends at `order.target`.
    /// `reservations` are honored throughout; waiting in place is allowed
    /// whenever it helps. When `stats` is given, one record per solve is
    /// appended.
    pub fn solve(
        &mut self,
        graph: &RouteGraph,
        order: &OrderInstance,
        reservations: &ReservationTable,
        offset: Time,
        stats: Option<&mut SolveStats>,
    ) -> Result<Tour, SolveError> {
        debug_assert!(order.class_count() <= self.max_classes);
        debug_assert!(order.len() <= self.max_candidates);
        let begun = Instant::now();
        self.reset();

        let candidates = order.candidates();
        let classes = order.classes();
        let dwell = order.pick_times();
        let class_count = order.class_count();
        let constraints = Some(reservations);

        // Seed every candidate straight from the start vertex.
        for i in 0..candidates.len() {
            let seeded = graph.shortest_route(
                &mut self.scratch,
                order.start,
                candidates[i],
                0,
                offset,
                constraints,
                SearchDir::Forward,
                false,
            )?;
            if let Some(route) = seeded {
                let t = route.time as usize;
                if t < self.time_limit {
                    *self.reached.get_mut(i, t) = true;
                    bitset::mark(self.states.row_mut(i, t), classes[i]);
                }
            }
        }

        // (finish, visit time, candidate, closing path)
        let mut best: Option<(Time, Time, usize, Vec<VertexId>)> = None;
        let mut t_max = self.time_limit;

        for t in 0..self.time_limit {
            if t >= t_max {
                break;
            }
            for i in 0..candidates.len() {
                if !*self.reached.get(i, t) {
                    continue;
                }
                bitset::mark(self.states.row_mut(i, t), classes[i]);

                if bitset::is_complete(self.states.row(i, t), class_count) {
                    // Complete labels only compete for the closing leg.
                    let closing = graph.shortest_route(
                        &mut self.scratch,
                        candidates[i],
                        order.target,
                        dwell[i],
                        t as Time + offset,
                        constraints,
                        SearchDir::Forward,
                        true,
                    )?;
                    if let Some(route) = closing {
                        let finish = t + route.time as usize;
                        if finish < t_max {
                            t_max = finish;
                            best = Some((
                                finish as Time,
                                t as Time,
                                i,
                                route.path.unwrap_or_default(),
                            ));
                        }
                    }
                    continue;
                }

                for j in 0..candidates.len() {
                    if classes[j] == classes[i] {
                        continue;
                    }
                    let hop = graph.shortest_route(
                        &mut self.scratch,
                        candidates[i],
                        candidates[j],
                        dwell[i],
                        t as Time + offset,
                        constraints,
                        SearchDir::Forward,
                        false,
                    )?;
                    if let Some(route) = hop {
                        let arrive = t + route.time as usize;
                        if arrive < self.time_limit {
                            *self.reached.get_mut(j, arrive) = true;
                            let (src, dst) = self.states.row_pair_mut((i, t), (j, arrive));
                            bitset::union_into(src, dst);
                        }
                    }
                }
            }
        }

        let Some((finish, visit_time, last, closing_path)) = best else {
            return Err(SolveError::NoTourFound {
                order: order.order_id,
                time_limit: self.time_limit as Time,
            });
        };

        let mut legs: Vec<TourLeg> = Vec::with_capacity(class_count + 1);
        legs.push(TourLeg {
            from: candidates[last],
            to: order.target,
            dwell: dwell[last],
            path: closing_path,
        });
        let mut remaining = ClassSet::full(class_count);
        remaining.remove(classes[last]);
        let mut visit_time = visit_time;
        let mut last_vertex = candidates[last];

        for _ in 0..class_count {
            let leg = self.backtrack_leg(
                graph,
                order,
                reservations,
                offset,
                visit_time,
                last_vertex,
                &mut remaining,
            )?;
            visit_time -= leg.path.len() as Time - 1 + leg.dwell;
            last_vertex = leg.from;
            legs.push(leg);
        }
        legs.reverse();

        let tour = Tour::from_legs(offset, legs);
        debug_assert_eq!(tour.length(), finish + 1);
        debug!(
            "order {}: tour of {} steps over {} classes",
            order.order_id,
            tour.length(),
            class_count
        );
        if let Some(stats) = stats {
            stats.record(SolveRecord {
                order: order.order_id,
                classes: class_count,
                candidates: candidates.len(),
                reservations: reservations.len(),
                tour_length: tour.length(),
                time: begun.elapsed().as_secs_f64(),
            });
        }
        Ok(tour)
    }

    /// Recovers the leg that arrives at `last_vertex` at `visit_time`. A
    /// candidate qualifies when the label at its implied departure time
    /// carries every class still unplaced; merged labels can lie about that,
    /// so when no candidate qualifies the departure is stretched step by
    /// step and re-verified with a forward query until one lands exactly on
    /// `visit_time`. Once every class is placed the leg from the start
    /// vertex closes the chain.
    fn backtrack_leg(
        &mut self,
        graph: &RouteGraph,
        order: &OrderInstance,
        reservations: &ReservationTable,
        offset: Time,
        visit_time: Time,
        last_vertex: VertexId,
        remaining: &mut ClassSet,
    ) -> Result<TourLeg, SolveError> {
        let candidates = order.candidates();
        let classes = order.classes();
        let dwell = order.pick_times();
        let constraints = Some(reservations);
        self.reverse_times[..candidates.len()].fill(0);

        for i in 0..candidates.len() {
            if !remaining.contains(classes[i]) {
                continue;
            }
            let found = graph.shortest_route(
                &mut self.scratch,
                candidates[i],
                last_vertex,
                dwell[i],
                visit_time + offset,
                constraints,
                SearchDir::Reverse,
                true,
            )?;
            let Some(route) = found else {
                continue;
            };
            let departure = visit_time - route.time;
            if departure < 0 {
                continue;
            }
            if bitset::contains_all(self.states.row(i, departure as usize), remaining) {
                remaining.remove(classes[i]);
                return Ok(TourLeg {
                    from: candidates[i],
                    to: last_vertex,
                    dwell: dwell[i],
                    path: route.path.unwrap_or_default(),
                });
            }
            self.reverse_times[i] = route.time;
        }

        if remaining.is_empty() {
            let found = graph.shortest_route(
                &mut self.scratch,
                order.start,
                last_vertex,
                0,
                visit_time + offset,
                constraints,
                SearchDir::Reverse,
                true,
            )?;
            if let Some(route) = found {
                if visit_time - route.time == 0 {
                    return Ok(TourLeg {
                        from: order.start,
                        to: last_vertex,
                        dwell: 0,
                        path: route.path.unwrap_or_default(),
                    });
                }
            }
            // The reverse answer missed the anchor; re-derive the opening
            // leg from the start side.
            warn!(
                "order {}: opening leg re-queried forward at offset {}",
                order.order_id, offset
            );
            let found = graph.shortest_route(
                &mut self.scratch,
                order.start,
                last_vertex,
                0,
                offset,
                constraints,
                SearchDir::Forward,
                true,
            )?;
            let Some(route) = found else {
                return Err(self.dead_end(order, visit_time, remaining));
            };
            debug_assert_eq!(
                visit_time, route.time,
                "opening leg must span exactly the time before the first pick"
            );
            return Ok(TourLeg {
                from: order.start,
                to: last_vertex,
                dwell: 0,
                path: route.path.unwrap_or_default(),
            });
        }

        // No label held every unplaced class at its implied departure, so
        // one of the merged labels was optimistic. Delay departures one step
        // at a time and accept the first forward route that still arrives on
        // schedule.
        for extension in 1..=visit_time {
            for i in 0..candidates.len() {
                if !remaining.contains(classes[i]) {
                    continue;
                }
                let departure = visit_time - self.reverse_times[i] - extension;
                if departure < 0 {
                    continue;
                }
                if !bitset::contains_all(self.states.row(i, departure as usize), remaining) {
                    continue;
                }
                let found = graph.shortest_route(
                    &mut self.scratch,
                    candidates[i],
                    last_vertex,
                    dwell[i],
                    departure + offset,
                    constraints,
                    SearchDir::Forward,
                    true,
                )?;
                if let Some(route) = found {
                    if departure + route.time == visit_time {
                        remaining.remove(classes[i]);
                        return Ok(TourLeg {
                            from: candidates[i],
                            to: last_vertex,
                            dwell: dwell[i],
                            path: route.path.unwrap_or_default(),
                        });
                    }
                }
            }
        }
        Err(self.dead_end(order, visit_time, remaining))
    }

    fn dead_end(&self, order: &OrderInstance, time: Time, remaining: &ClassSet) -> SolveError {
        SolveError::BacktrackDeadEnd {
            order: order.order_id,
            time,
            remaining: remaining.iter().collect(),
        }
    }
}

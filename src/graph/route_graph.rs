use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::graph::astar::{SearchDir, SearchError, SearchScratch};
use crate::graph::reservations::ReservationTable;
use crate::order::OrderInstance;
use crate::types::{Coord, Time, VertexId};
use crate::utils::Matrix2;

/// Rack contents reachable from a storage access vertex, one item per shelf
/// level (index 0 = ground).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShelfStack {
    pub items: Vec<u32>,
}

/// Construction-only tag; routing treats every vertex alike.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum VertexKind {
    #[default]
    Plain,
    Staging,
    Storage {
        left: Option<ShelfStack>,
        right: Option<ShelfStack>,
    },
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub coord: Coord,
    pub kind: VertexKind,
    pub(crate) edges: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    pub cost: Time,
}

impl Edge {
    #[inline(always)]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.a == v { self.b } else { self.a }
    }
}

/// A planned leg: total duration (dwell + travel) and, when requested, the
/// time-indexed path from origin to destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedRoute {
    pub time: Time,
    pub path: Option<Vec<VertexId>>,
}

/// Distance and route oracle over the warehouse graph. `initialize` primes
/// the caches for an order set; afterwards the graph is immutable and may be
/// shared read-only across any number of concurrent solves.
pub struct RouteGraph {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) distances: Matrix2<Time>,
    routes: HashMap<(VertexId, VertexId), Box<[VertexId]>>,
}

impl RouteGraph {
    pub fn new() -> Self {
        RouteGraph {
            vertices: Vec::new(),
            edges: Vec::new(),
            distances: Matrix2::new(0, 0, 0),
            routes: HashMap::new(),
        }
    }

    pub fn add_vertex(&mut self, coord: Coord, kind: VertexKind) -> VertexId {
        debug_assert!(self.vertices.len() < VertexId::MAX as usize);
        let id = self.vertices.len() as VertexId;
        self.vertices.push(Vertex {
            coord,
            kind,
            edges: Vec::new(),
        });
        id
    }

    pub fn add_edge(&mut self, a: VertexId, b: VertexId, cost: Time) {
        // costs are stored as given; the time expansion advances one step
        // per traversal regardless of cost
        debug_assert!(cost >= 1, "traversal costs are positive");
        let idx = self.edges.len() as u32;
        self.edges.push(Edge { a, b, cost });
        self.vertices[a as usize].edges.push(idx);
        self.vertices[b as usize].edges.push(idx);
    }

    #[inline(always)]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline(always)]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v as usize]
    }

    /// Cached hop distance between two vertices; 0 doubles as "self or never
    /// computed".
    #[inline(always)]
    pub fn distance(&self, a: VertexId, b: VertexId) -> Time {
        *self.distances.get(a as usize, b as usize)
    }

    /// Cached concrete path for a pair that co-occurred in an order.
    pub fn cached_route(&self, a: VertexId, b: VertexId) -> Option<&[VertexId]> {
        self.routes.get(&(a, b)).map(|p| p.as_ref())
    }

    /// Primes the caches for an order set: one BFS per vertex referenced by
    /// any order (every row filled before the columns are mirrored), and one
    /// unconstrained search per vertex pair co-occurring within one order,
    /// cached forward and exactly reversed.
    pub fn initialize(&mut self, orders: &[OrderInstance]) -> Result<(), SearchError> {
        let count = self.vertices.len();
        self.distances = Matrix2::new(count, count, 0);
        self.routes.clear();

        let mut used: HashSet<VertexId> = HashSet::new();
        for order in orders {
            used.insert(order.start);
            used.insert(order.target);
            used.extend(order.candidates().iter().copied());
        }

        let mut queue = VecDeque::with_capacity(count);
        for &vertex in &used {
            self.bfs(vertex, &mut queue);
        }
        // Mirror only after every row is complete: bfs treats a nonzero
        // entry as visited.
        for &vertex in &used {
            for i in 0..count {
                *self.distances.get_mut(i, vertex as usize) =
                    *self.distances.get(vertex as usize, i);
            }
        }

        let mut scratch = SearchScratch::new(count);
        let mut pair_list: Vec<VertexId> = Vec::new();
        for order in orders {
            pair_list.clear();
            pair_list.push(order.start);
            pair_list.push(order.target);
            pair_list.extend_from_slice(order.candidates());
            for j in 0..pair_list.len() {
                for k in j + 1..pair_list.len() {
                    let (a, b) = (pair_list[j], pair_list[k]);
                    if self.routes.contains_key(&(a, b)) {
                        continue;
                    }
                    let (_, path) = self.astar(&mut scratch, a, b, None, 0, SearchDir::Forward)?;
                    let mut reversed = path.clone();
                    reversed.reverse();
                    self.routes.insert((a, b), path.into_boxed_slice());
                    self.routes.insert((b, a), reversed.into_boxed_slice());
                }
            }
        }
        debug!(
            "route caches primed: {} used vertices, {} cached pairs",
            used.len(),
            self.routes.len()
        );
        Ok(())
    }

    fn bfs(&mut self, source: VertexId, queue: &mut VecDeque<(VertexId, Time)>) {
        let src = source as usize;
        queue.clear();
        queue.push_back((source, 0));
        while let Some((vertex, depth)) = queue.pop_front() {
            for &edge_idx in &self.vertices[vertex as usize].edges {
                let neighbor = self.edges[edge_idx as usize].other(vertex);
                if *self.distances.get(src, neighbor as usize) == 0 {
                    *self.distances.get_mut(src, neighbor as usize) = depth + 1;
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }
        *self.distances.get_mut(src, src) = 0;
    }

    /// Cheapest duration from `from` to `to` when the agent first dwells
    /// `dwell` steps at `from`. `Forward` anchors the dwell start at
    /// `at_time`; `Reverse` anchors the arrival at `to` instead. The cached
    /// route is returned untouched unless a reservation falls inside its
    /// occupancy window: a hit on the origin during the dwell makes the leg
    /// impossible (the agent is pinned and cannot be displaced), any other
    /// collision abandons the cache for a constrained search whose cost then
    /// carries the dwell. `None` is the universal "no route" answer; a
    /// reverse window starting before time zero skips verification entirely.
    ///
    /// Both endpoints should have co-occurred in an order given to
    /// `initialize`; an unprimed pair is searched from scratch instead of
    /// answered from cache.
    pub fn shortest_route(
        &self,
        scratch: &mut SearchScratch,
        from: VertexId,
        to: VertexId,
        dwell: Time,
        at_time: Time,
        constraints: Option<&ReservationTable>,
        dir: SearchDir,
        want_path: bool,
    ) -> Result<Option<PlannedRoute>, SearchError> {
        let primed = self.routes.get(&(from, to));
        debug_assert!(
            primed.is_some(),
            "pair ({from}, {to}) was never primed by initialize"
        );
        let Some(path) = primed else {
            return self.searched_route(scratch, from, to, dwell, at_time, constraints, dir, want_path);
        };

        let total = self.distance(from, to) + dwell;
        let (min_time, max_time) = match dir {
            SearchDir::Forward => (at_time, at_time + total),
            SearchDir::Reverse => (at_time - total, at_time),
        };

        if let Some(table) = constraints {
            if min_time >= 0 {
                for (time, reserved) in table.window(min_time, max_time) {
                    let rel = time - min_time;
                    for &vertex in reserved {
                        if rel <= dwell {
                            if vertex == from {
                                return Ok(None);
                            }
                        } else if path[(rel - dwell) as usize] == vertex {
                            return self.searched_route(
                                scratch, from, to, dwell, at_time, constraints, dir, want_path,
                            );
                        }
                    }
                }
            }
        }

        if total == 0 {
            return Ok(None);
        }
        Ok(Some(PlannedRoute {
            time: total,
            path: want_path.then(|| path.to_vec()),
        }))
    }

    /// Constrained leg search bypassing the caches. The dwell pins the agent
    /// at `from`, so the forward search is anchored after it; callers have
    /// already cleared the dwell interval of origin conflicts.
    fn searched_route(
        &self,
        scratch: &mut SearchScratch,
        from: VertexId,
        to: VertexId,
        dwell: Time,
        at_time: Time,
        constraints: Option<&ReservationTable>,
        dir: SearchDir,
        want_path: bool,
    ) -> Result<Option<PlannedRoute>, SearchError> {
        let begin = match dir {
            SearchDir::Forward => at_time + dwell,
            SearchDir::Reverse => at_time,
        };
        debug!("leg {from}->{to} at {at_time}: cache bypassed, searching from {begin}");
        let (cost, route) = self.astar(scratch, from, to, constraints, begin, dir)?;
        let time = cost + dwell;
        if time == 0 {
            return Ok(None);
        }
        Ok(Some(PlannedRoute {
            time,
            path: want_path.then_some(route),
        }))
    }
}

impl Default for RouteGraph {
    fn default() -> Self {
        Self::new()
    }
}

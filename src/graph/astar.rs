use thiserror::Error;

use crate::graph::reservations::ReservationTable;
use crate::graph::route_graph::RouteGraph;
use crate::types::{Time, VertexId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The open set ran dry between endpoints that should be reachable.
    #[error("search space exhausted between vertex {from} and vertex {to}")]
    Exhausted { from: VertexId, to: VertexId },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchDir {
    /// Depart the origin at the anchor time, stepping forward.
    Forward,
    /// Arrive at the destination at the anchor time, stepping backward.
    Reverse,
}

const NONE: u32 = u32::MAX;

#[derive(Copy, Clone, Debug)]
struct SearchNode {
    vertex: VertexId,
    cost: Time,
    pred: u32,
    key: i64,
    heap_pos: u32,
}

/// Among equal estimates the deeper node wins the tie.
#[inline(always)]
fn priority(cost: Time, remaining: Time) -> i64 {
    (((cost + remaining) as i64) << 10) - cost as i64
}

/// Per-worker scratch for the time-expanded search: a node arena addressed
/// by index, an open-position table mapping vertex to its open node, and an
/// indexed binary heap that re-prioritizes open nodes in place. Reset before
/// every search; allocations are reused.
pub struct SearchScratch {
    nodes: Vec<SearchNode>,
    open: Vec<u32>,
    heap: Vec<u32>,
}

impl SearchScratch {
    pub fn new(vertex_count: usize) -> Self {
        SearchScratch {
            nodes: Vec::with_capacity(2 * vertex_count),
            open: vec![NONE; vertex_count],
            heap: Vec::with_capacity(vertex_count),
        }
    }

    fn reset(&mut self, vertex_count: usize) {
        self.nodes.clear();
        self.heap.clear();
        if self.open.len() != vertex_count {
            self.open.resize(vertex_count, NONE);
        }
        self.open.fill(NONE);
    }

    fn alloc(&mut self, vertex: VertexId, cost: Time, pred: u32, key: i64) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(SearchNode {
            vertex,
            cost,
            pred,
            key,
            heap_pos: NONE,
        });
        idx
    }

    fn push(&mut self, node: u32) {
        let pos = self.heap.len();
        self.heap.push(node);
        self.nodes[node as usize].heap_pos = pos as u32;
        self.sift_up(pos);
    }

    fn pop(&mut self) -> Option<u32> {
        let top = *self.heap.first()?;
        let last = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.nodes[last as usize].heap_pos = 0;
            self.sift_down(0);
        }
        self.nodes[top as usize].heap_pos = NONE;
        Some(top)
    }

    /// Re-sorts `node` after its key decreased.
    fn decrease(&mut self, node: u32) {
        let pos = self.nodes[node as usize].heap_pos;
        debug_assert!(pos != NONE, "relaxed node is not on the heap");
        self.sift_up(pos as usize);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key_at(pos) < self.key_at(parent) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;
            if left < self.heap.len() && self.key_at(left) < self.key_at(best) {
                best = left;
            }
            if right < self.heap.len() && self.key_at(right) < self.key_at(best) {
                best = right;
            }
            if best == pos {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }

    #[inline(always)]
    fn key_at(&self, pos: usize) -> i64 {
        self.nodes[self.heap[pos] as usize].key
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.nodes[self.heap[a] as usize].heap_pos = a as u32;
        self.nodes[self.heap[b] as usize].heap_pos = b as u32;
    }

    /// Walks the predecessor chain into a time-indexed vertex sequence of
    /// length cost + 1. Waits repeat their vertex.
    fn rebuild_path(&self, goal: u32) -> Vec<VertexId> {
        let mut path = vec![0 as VertexId; self.nodes[goal as usize].cost as usize + 1];
        let mut at = goal;
        for slot in path.iter_mut().rev() {
            let node = &self.nodes[at as usize];
            *slot = node.vertex;
            at = node.pred;
        }
        path
    }
}

impl RouteGraph {
    /// Time-expanded A* between two vertices, honoring the reservation table
    /// when one is supplied. The returned path always reads `from..to`; its
    /// length is cost + 1. Waiting in place is a unit-cost move, offered only
    /// under constraints.
    pub(crate) fn astar(
        &self,
        scratch: &mut SearchScratch,
        from: VertexId,
        to: VertexId,
        constraints: Option<&ReservationTable>,
        begin_time: Time,
        dir: SearchDir,
    ) -> Result<(Time, Vec<VertexId>), SearchError> {
        let (x, y) = match dir {
            SearchDir::Forward => (from, to),
            SearchDir::Reverse => (to, from),
        };
        scratch.reset(self.vertex_count());
        let start = scratch.alloc(x, 0, NONE, 0);
        scratch.open[x as usize] = start;
        scratch.push(start);

        while let Some(curr) = scratch.pop() {
            let node = scratch.nodes[curr as usize];
            if node.vertex == y {
                let mut path = scratch.rebuild_path(curr);
                if dir == SearchDir::Reverse {
                    path.reverse();
                }
                return Ok((node.cost, path));
            }
            scratch.open[node.vertex as usize] = NONE;

            let next_cost = node.cost + 1;
            let arrival = match dir {
                SearchDir::Forward => begin_time + next_cost,
                SearchDir::Reverse => begin_time - next_cost,
            };

            // Waiting re-enqueues the current vertex; the node is recognizable
            // later by its predecessor sharing its vertex and is never relaxed.
            if let Some(table) = constraints {
                if !table.is_reserved(arrival, node.vertex) {
                    let remaining = *self.distances.get(node.vertex as usize, y as usize);
                    let idx = scratch.alloc(
                        node.vertex,
                        next_cost,
                        curr,
                        priority(next_cost, remaining),
                    );
                    scratch.open[node.vertex as usize] = idx;
                    scratch.push(idx);
                }
            }

            for &edge_idx in &self.vertices[node.vertex as usize].edges {
                let neighbor = self.edges[edge_idx as usize].other(node.vertex);

                // Never bounce straight back to the vertex last departed;
                // wait chains are walked through to find it.
                if node.pred != NONE {
                    let pred = &scratch.nodes[node.pred as usize];
                    if pred.vertex == neighbor {
                        continue;
                    }
                    if pred.vertex == node.vertex {
                        let mut back = node.pred;
                        while scratch.nodes[back as usize].pred != NONE
                            && scratch.nodes[back as usize].vertex == node.vertex
                        {
                            back = scratch.nodes[back as usize].pred;
                        }
                        if scratch.nodes[back as usize].vertex == neighbor {
                            continue;
                        }
                    }
                }

                if let Some(table) = constraints {
                    if table.is_reserved(arrival, neighbor) {
                        continue;
                    }
                }

                let remaining = *self.distances.get(neighbor as usize, y as usize);
                let key = priority(next_cost, remaining);
                let open_idx = scratch.open[neighbor as usize];
                if open_idx != NONE {
                    let open_node = scratch.nodes[open_idx as usize];
                    let requeued = open_node.pred != NONE
                        && scratch.nodes[open_node.pred as usize].vertex == open_node.vertex;
                    if open_node.cost > next_cost && !requeued {
                        let relaxed = &mut scratch.nodes[open_idx as usize];
                        relaxed.cost = next_cost;
                        relaxed.pred = curr;
                        relaxed.key = key;
                        scratch.decrease(open_idx);
                    }
                } else {
                    let idx = scratch.alloc(neighbor, next_cost, curr, key);
                    scratch.open[neighbor as usize] = idx;
                    scratch.push(idx);
                }
            }
        }

        Err(SearchError::Exhausted { from, to })
    }
}

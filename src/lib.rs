//! Order-picking route planner for grid warehouses.
//!
//! Given a warehouse graph, an order (candidate pick locations grouped into
//! item classes) and a table of space-time reservations held by other agents,
//! the solver finds a minimal-duration tour that starts at a depot, picks one
//! location per class and ends at a target without entering a reserved
//! (time, vertex) pair. The graph's distance and route caches are primed once
//! per order set and shared read-only across workers; each worker owns its
//! solver and search scratch.

pub mod graph;
pub mod order;
pub mod solver;
pub mod stats;
pub mod tour;
pub mod types;
pub mod utils;

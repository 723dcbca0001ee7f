mod astar;
mod layout;
mod reservations;
mod route_graph;

pub use astar::{SearchDir, SearchError, SearchScratch};
pub use layout::{Cell, ItemSlot, Warehouse, pick_duration};
pub use reservations::ReservationTable;
pub use route_graph::{Edge, PlannedRoute, RouteGraph, ShelfStack, Vertex, VertexKind};

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::graph::route_graph::{RouteGraph, ShelfStack, VertexKind};
use crate::types::{Coord, ShelfSide, Time, VertexId};
use crate::utils::Matrix2;

const PICK_TIME_BASE: Time = 120;
const PICK_TIME_PER_LEVEL: Time = 4;
const PICK_SECURE_SURCHARGE: Time = 120;
const SECURE_LEVEL: u8 = 3;

/// Dwell duration for an item picked at shelf `level` (0 = ground). Levels
/// at `SECURE_LEVEL` and above need the picker secured, which costs extra.
pub fn pick_duration(level: u8) -> Time {
    if level == 0 {
        return PICK_TIME_BASE;
    }
    let base = PICK_TIME_BASE + PICK_TIME_PER_LEVEL * level as Time;
    if level < SECURE_LEVEL {
        base
    } else {
        base + PICK_SECURE_SURCHARGE
    }
}

/// One cell of the warehouse floor plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Floor,
    Staging,
    /// Shelf levels bottom-up, one item id per level.
    Rack(Vec<u32>),
}

/// A pickable shelf position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemSlot {
    pub vertex: VertexId,
    pub side: ShelfSide,
    pub level: u8,
}

/// Grid-built warehouse: the routable graph plus the item and staging
/// indexes collected while building it.
pub struct Warehouse {
    pub graph: RouteGraph,
    staging: Vec<VertexId>,
    item_slots: HashMap<u32, Vec<ItemSlot>>,
    coord_index: HashMap<Coord, VertexId>,
}

impl Warehouse {
    /// Builds the graph from a floor plan. Every non-rack cell becomes a
    /// vertex, wired to its upper and left non-rack neighbors with unit
    /// cost; a floor cell flanked by racks becomes a storage access vertex
    /// carrying the adjacent shelf stacks; staging cells keep their tag.
    pub fn from_grid(grid: &Matrix2<Cell>) -> Warehouse {
        let mut graph = RouteGraph::new();
        let mut staging = Vec::new();
        let mut item_slots: HashMap<u32, Vec<ItemSlot>> = HashMap::new();
        let mut coord_index = HashMap::new();
        let mut vertex_grid = Matrix2::new(grid.rows, grid.cols, -1i32);

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let kind = match grid.get(row, col) {
                    Cell::Rack(_) => continue,
                    Cell::Staging => VertexKind::Staging,
                    Cell::Floor => {
                        let left = rack_items(grid, row, col.wrapping_sub(1));
                        let right = rack_items(grid, row, col + 1);
                        if left.is_some() || right.is_some() {
                            VertexKind::Storage {
                                left: left.map(|items| ShelfStack {
                                    items: items.to_vec(),
                                }),
                                right: right.map(|items| ShelfStack {
                                    items: items.to_vec(),
                                }),
                            }
                        } else {
                            VertexKind::Plain
                        }
                    }
                };

                let coord = Coord::new(col as u16, row as u16);
                let id = graph.add_vertex(coord, kind);
                *vertex_grid.get_mut(row, col) = id as i32;
                coord_index.insert(coord, id);

                match &graph.vertex(id).kind {
                    VertexKind::Staging => staging.push(id),
                    VertexKind::Storage { left, right } => {
                        if let Some(stack) = left {
                            register_slots(&mut item_slots, id, ShelfSide::Left, stack);
                        }
                        if let Some(stack) = right {
                            register_slots(&mut item_slots, id, ShelfSide::Right, stack);
                        }
                    }
                    VertexKind::Plain => {}
                }

                if row > 0 {
                    let up = *vertex_grid.get(row - 1, col);
                    if up >= 0 {
                        graph.add_edge(up as VertexId, id, 1);
                    }
                }
                if col > 0 {
                    let left = *vertex_grid.get(row, col - 1);
                    if left >= 0 {
                        graph.add_edge(left as VertexId, id, 1);
                    }
                }
            }
        }

        Warehouse {
            graph,
            staging,
            item_slots,
            coord_index,
        }
    }

    /// Resolves a grid coordinate to its vertex, if the cell is routable.
    pub fn vertex_at(&self, coord: Coord) -> Option<VertexId> {
        self.coord_index.get(&coord).copied()
    }

    pub fn staging(&self) -> &[VertexId] {
        &self.staging
    }

    /// Every shelf position holding `item`, in grid scan order.
    pub fn slots_for_item(&self, item: u32) -> &[ItemSlot] {
        self.item_slots.get(&item).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn rack_items(grid: &Matrix2<Cell>, row: usize, col: usize) -> Option<&[u32]> {
    if col >= grid.cols {
        return None;
    }
    match grid.get(row, col) {
        Cell::Rack(items) => Some(items),
        _ => None,
    }
}

fn register_slots(
    slots: &mut HashMap<u32, Vec<ItemSlot>>,
    vertex: VertexId,
    side: ShelfSide,
    stack: &ShelfStack,
) {
    for (level, &item) in stack.items.iter().enumerate() {
        slots.entry(item).or_default().push(ItemSlot {
            vertex,
            side,
            level: level as u8,
        });
    }
}

pub type VertexId = u16;
pub type ClassId = u16;
pub type OrderId = u16;
pub type Time = i32;

/// Shelf side of a storage access vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShelfSide {
    Left,
    Right,
}

/// Grid cell coordinate (column, row).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: u16,
    pub y: u16,
}

impl Coord {
    #[inline(always)]
    pub fn new(x: u16, y: u16) -> Self {
        Coord { x, y }
    }
}

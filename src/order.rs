use thiserror::Error;

use crate::graph::{ItemSlot, pick_duration};
use crate::types::{ClassId, OrderId, Time, VertexId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("order {0} has no pick candidates")]
    Empty(OrderId),
    #[error(
        "order {order}: classes must ascend contiguously from 1 (candidate {index} has class {found})"
    )]
    ClassGap {
        order: OrderId,
        index: usize,
        found: ClassId,
    },
    #[error("order {order}: candidate {index} has dwell {dwell}, picks take at least one step")]
    ShortDwell {
        order: OrderId,
        index: usize,
        dwell: Time,
    },
}

/// One picking order: start and drop-off vertices plus candidate pick
/// locations grouped into item classes `1..=C`. A tour visits exactly one
/// candidate per class.
#[derive(Clone, Debug)]
pub struct OrderInstance {
    pub order_id: OrderId,
    pub start: VertexId,
    pub target: VertexId,
    vertices: Vec<VertexId>,
    classes: Vec<ClassId>,
    pick_times: Vec<Time>,
}

impl OrderInstance {
    /// Builds and validates an order from `(vertex, class, dwell)` triples.
    /// Classes must ascend contiguously from 1; dwells are at least 1.
    pub fn new(
        order_id: OrderId,
        start: VertexId,
        target: VertexId,
        picks: impl IntoIterator<Item = (VertexId, ClassId, Time)>,
    ) -> Result<Self, OrderError> {
        let mut vertices = Vec::new();
        let mut classes = Vec::new();
        let mut pick_times = Vec::new();
        for (vertex, class, dwell) in picks {
            vertices.push(vertex);
            classes.push(class);
            pick_times.push(dwell);
        }
        if vertices.is_empty() {
            return Err(OrderError::Empty(order_id));
        }
        let mut prev: ClassId = 0;
        for (index, &class) in classes.iter().enumerate() {
            if class == 0 || (class != prev && class != prev + 1) {
                return Err(OrderError::ClassGap {
                    order: order_id,
                    index,
                    found: class,
                });
            }
            prev = class;
        }
        for (index, &dwell) in pick_times.iter().enumerate() {
            if dwell < 1 {
                return Err(OrderError::ShortDwell {
                    order: order_id,
                    index,
                    dwell,
                });
            }
        }
        Ok(OrderInstance {
            order_id,
            start,
            target,
            vertices,
            classes,
            pick_times,
        })
    }

    /// Builds an order from per-class groups of shelf slots: group `g`
    /// becomes class `g + 1`, with dwell from the pick formula.
    pub fn from_item_groups(
        order_id: OrderId,
        start: VertexId,
        target: VertexId,
        groups: &[Vec<ItemSlot>],
    ) -> Result<Self, OrderError> {
        Self::new(
            order_id,
            start,
            target,
            groups.iter().enumerate().flat_map(|(g, slots)| {
                slots
                    .iter()
                    .map(move |slot| (slot.vertex, (g + 1) as ClassId, pick_duration(slot.level)))
            }),
        )
    }

    #[inline(always)]
    pub fn candidates(&self) -> &[VertexId] {
        &self.vertices
    }

    #[inline(always)]
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    #[inline(always)]
    pub fn pick_times(&self) -> &[Time] {
        &self.pick_times
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of item classes. Classes are contiguous, so the last one is
    /// the count.
    #[inline(always)]
    pub fn class_count(&self) -> usize {
        self.classes.last().copied().unwrap_or(0) as usize
    }
}

const TRAVEL_SLACK: Time = 50;

/// Sizing scan over an order set, used to dimension pooled solvers once for
/// many solves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderExtents {
    pub max_classes: usize,
    pub max_candidates: usize,
    pub max_pick_time: Time,
    pub order_count: usize,
}

impl OrderExtents {
    pub fn scan<'a>(orders: impl IntoIterator<Item = &'a OrderInstance>) -> OrderExtents {
        let mut extents = OrderExtents::default();
        for order in orders {
            extents.max_classes = extents.max_classes.max(order.class_count());
            extents.max_candidates = extents.max_candidates.max(order.len());
            for &dwell in order.pick_times() {
                extents.max_pick_time = extents.max_pick_time.max(dwell);
            }
            extents.order_count += 1;
        }
        extents
    }

    /// Rough upper bound on tour duration: one pick per class, each costing
    /// its dwell plus travel slack. Warehouses with longer hauls between
    /// picks need a caller-supplied bound instead.
    pub fn suggested_time_limit(&self) -> Time {
        self.max_classes as Time * (self.max_pick_time + TRAVEL_SLACK)
    }
}

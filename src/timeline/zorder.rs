use crate::{
    document::model::{LayerId, LayerInfo},
    timeline::subroutine::{SubRoutineCollection, SubRoutineId},
};

/// A renderable item of the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZItem {
    /// Document layer, with its index in UI order (0 = top-most).
    Layer {
        /// Layer id.
        id: LayerId,
        /// Position in the UI list, top first.
        ui_index: usize,
    },
    /// Sub-routine by id.
    SubRoutine(SubRoutineId),
}

/// An item with its resolved Z rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZEntry {
    /// What is drawn.
    pub item: ZItem,
    /// Rank; higher paints later.
    pub z: i64,
}

/// Implicit Z of a layer: the top-most UI row gets the highest rank.
pub fn layer_z(layer_count: usize, ui_index: usize) -> i64 {
    layer_count as i64 - 1 - ui_index as i64
}

/// UI stacking list, top first.
///
/// `layers` is the document's bottom-to-top order. Items are sorted stably by
/// descending Z starting from layers in UI order followed by sub-routines in
/// insertion order, so ties keep that order.
pub fn stacking_order(layers: &[LayerInfo], subs: &SubRoutineCollection) -> Vec<ZEntry> {
    let n = layers.len();
    let mut items: Vec<ZEntry> = layers
        .iter()
        .rev()
        .enumerate()
        .map(|(ui_index, l)| ZEntry {
            item: ZItem::Layer {
                id: l.id,
                ui_index,
            },
            z: layer_z(n, ui_index),
        })
        .chain(subs.iter().map(|s| ZEntry {
            item: ZItem::SubRoutine(s.id()),
            z: i64::from(s.z_order),
        }))
        .collect();
    items.sort_by(|a, b| b.z.cmp(&a.z));
    items
}

/// Compositing order: the stacking list walked bottom to top.
pub fn paint_order(layers: &[LayerInfo], subs: &SubRoutineCollection) -> Vec<ZEntry> {
    let mut items = stacking_order(layers, subs);
    items.reverse();
    items
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/zorder.rs"]
mod tests;

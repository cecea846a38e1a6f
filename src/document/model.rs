use std::collections::{HashMap, HashSet};

use crate::{
    foundation::core::Canvas,
    foundation::error::{PixreelError, PixreelResult},
    render::surface::Surface,
    timeline::layer_track::LayerSnapshot,
};

/// Opaque, stable identifier of a document layer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Identity of one document layer as seen by the timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerInfo {
    /// Stable layer id.
    pub id: LayerId,
    /// Current display name.
    pub name: String,
}

/// Per-layer substitutions applied while flattening one frame.
#[derive(Clone, Debug, Default)]
pub struct LayerOverrides<'a> {
    resolved: HashMap<LayerId, &'a LayerSnapshot>,
    excluded: HashSet<LayerId>,
}

impl<'a> LayerOverrides<'a> {
    /// No overrides: every layer composites with its static state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `snapshot` instead of the layer's static state.
    pub fn set(&mut self, id: LayerId, snapshot: &'a LayerSnapshot) {
        self.resolved.insert(id, snapshot);
    }

    /// Leave the layer out of the flattened result entirely.
    pub fn exclude(&mut self, id: LayerId) {
        self.excluded.insert(id);
    }

    /// Snapshot substituted for `id`, if any.
    pub fn snapshot(&self, id: LayerId) -> Option<&'a LayerSnapshot> {
        self.resolved.get(&id).copied()
    }

    /// `true` when `id` must not be composited.
    pub fn is_excluded(&self, id: LayerId) -> bool {
        self.excluded.contains(&id)
    }
}

/// The layered raster document the timeline animates.
///
/// Implemented by the host editor; [`RasterDocument`] is the in-crate version.
pub trait LayerDocument {
    /// Canvas dimensions.
    fn canvas(&self) -> Canvas;

    /// Layers in paint order, bottom to top.
    fn flattened_layers(&self) -> Vec<LayerInfo>;

    /// Flatten the layers into `surface` (which must match [`Self::canvas`]),
    /// applying `overrides`.
    fn composite_to(&self, surface: &mut Surface, overrides: &LayerOverrides<'_>)
    -> PixreelResult<()>;
}

/// One raster layer of a [`RasterDocument`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RasterLayer {
    /// Stable id.
    pub id: LayerId,
    /// Display name.
    pub name: String,
    /// Static visibility.
    pub visible: bool,
    /// Static opacity in `[0, 1]`.
    pub opacity: f32,
    /// Layer pixels, canvas sized.
    pub surface: Surface,
}

/// Simple in-memory layered document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RasterDocument {
    canvas: Canvas,
    layers: Vec<RasterLayer>, // bottom to top
}

impl RasterDocument {
    /// Document with no layers.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            layers: Vec::new(),
        }
    }

    /// Append a layer on top and return its id.
    pub fn add_layer(&mut self, name: impl Into<String>, surface: Surface) -> PixreelResult<LayerId> {
        if surface.canvas() != self.canvas {
            return Err(PixreelError::validation(format!(
                "layer surface {}x{} does not match canvas {}x{}",
                surface.width(),
                surface.height(),
                self.canvas.width,
                self.canvas.height
            )));
        }
        let id = LayerId(self.layers.iter().map(|l| l.id.0 + 1).max().unwrap_or(1));
        self.layers.push(RasterLayer {
            id,
            name: name.into(),
            visible: true,
            opacity: 1.0,
            surface,
        });
        Ok(id)
    }

    /// Remove a layer; returns it when found.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<RasterLayer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    /// Rename a layer; returns `false` when not found.
    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        match self.layer_mut(id) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Layer by id.
    pub fn layer(&self, id: LayerId) -> Option<&RasterLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Mutable layer by id.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut RasterLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// All layers, bottom to top.
    pub fn layers(&self) -> &[RasterLayer] {
        &self.layers
    }

    /// Check every layer surface against the canvas.
    pub fn validate(&self) -> PixreelResult<()> {
        for layer in &self.layers {
            layer.surface.validate()?;
            if layer.surface.canvas() != self.canvas {
                return Err(PixreelError::validation(format!(
                    "layer '{}' does not match the canvas size",
                    layer.name
                )));
            }
        }
        Ok(())
    }
}

impl LayerDocument for RasterDocument {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn flattened_layers(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|l| LayerInfo {
                id: l.id,
                name: l.name.clone(),
            })
            .collect()
    }

    fn composite_to(
        &self,
        surface: &mut Surface,
        overrides: &LayerOverrides<'_>,
    ) -> PixreelResult<()> {
        if surface.canvas() != self.canvas {
            return Err(PixreelError::render(
                "composite target must match the document canvas",
            ));
        }
        for layer in &self.layers {
            if overrides.is_excluded(layer.id) {
                continue;
            }
            let (visible, opacity, offset, content) = match overrides.snapshot(layer.id) {
                Some(s) => (
                    s.visible,
                    s.opacity,
                    s.offset,
                    s.pixels.as_ref().unwrap_or(&layer.surface),
                ),
                None => (layer.visible, layer.opacity, (0, 0), &layer.surface),
            };
            if !visible {
                continue;
            }
            content.composite_to(surface, i64::from(offset.0), i64::from(offset.1), opacity);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;

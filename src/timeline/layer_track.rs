use crate::{
    animation::keyframes::KeyframeTrack, document::model::LayerId, render::surface::Surface,
};

/// Layer state stored in a layer keyframe.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerSnapshot {
    /// Whether the layer contributes to the frame.
    pub visible: bool,
    /// Layer opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Integer pixel offset applied to the layer content.
    #[serde(default)]
    pub offset: (i32, i32),
    /// Replacement raster for this frame; `None` keeps the layer's own pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixels: Option<Surface>,
}

fn default_opacity() -> f32 {
    1.0
}

impl Default for LayerSnapshot {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            offset: (0, 0),
            pixels: None,
        }
    }
}

impl LayerSnapshot {
    /// Snapshot that hides the layer.
    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }
}

/// Per-layer keyframes with hold (step) semantics.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerTrack {
    /// Document layer this track animates.
    pub layer_id: LayerId,
    /// Display name mirrored from the document layer.
    pub name: String,
    /// Layer keyframes.
    pub keyframes: KeyframeTrack<LayerSnapshot>,
}

impl LayerTrack {
    /// Empty track for a document layer.
    pub fn new(layer_id: LayerId, name: impl Into<String>) -> Self {
        Self {
            layer_id,
            name: name.into(),
            keyframes: KeyframeTrack::new(),
        }
    }

    /// Snapshot in effect at `frame`: the greatest keyframe at or before it.
    ///
    /// `None` before the first keyframe; the layer then keeps its static state.
    pub fn resolve(&self, frame: u32) -> Option<&LayerSnapshot> {
        self.keyframes.hold_at(frame).map(|(_, s)| s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/layer_track.rs"]
mod tests;

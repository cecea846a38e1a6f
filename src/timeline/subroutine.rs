use std::path::PathBuf;

use crate::{
    animation::channel::Channel,
    animation::ease::Ease,
    assets::reel::ReelResolver,
    foundation::core::{FrameRange, Vec2},
    foundation::error::{PixreelError, PixreelResult},
    render::surface::Surface,
};

/// Stable identifier of a sub-routine within one animation.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct SubRoutineId(pub u64);

/// Column/row address of a tile in a tileset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TileCoord {
    /// Tile column.
    pub col: u32,
    /// Tile row.
    pub row: u32,
}

/// Where a sub-routine's frames come from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReelSource {
    /// Frames stored inline with the animation.
    Embedded {
        /// One surface per reel frame.
        frames: Vec<Surface>,
    },
    /// Horizontal PNG strip of equally wide frames.
    SpriteSheet {
        /// Path of the PNG, relative to the resolver root.
        path: PathBuf,
        /// Number of frames in the strip.
        frame_count: u32,
    },
    /// Older files: frames are tiles of a named tileset.
    LegacyTiles {
        /// File format version that produced the reference.
        format_version: u32,
        /// Tileset name.
        tileset: String,
        /// One tile per reel frame.
        tiles: Vec<TileCoord>,
    },
}

impl ReelSource {
    /// `true` when pixel data travels with the animation itself.
    pub fn has_embedded_pixels(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }

    /// Format version for legacy references.
    pub fn format_version(&self) -> Option<u32> {
        match self {
            Self::LegacyTiles { format_version, .. } => Some(*format_version),
            _ => None,
        }
    }
}

/// Resolved reel pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Reel {
    frames: Vec<Surface>,
}

impl Reel {
    /// Build a reel; at least one well-formed frame is required.
    pub fn new(frames: Vec<Surface>) -> PixreelResult<Self> {
        if frames.is_empty() {
            return Err(PixreelError::resource("reel has no frames"));
        }
        for frame in &frames {
            frame.validate()?;
        }
        Ok(Self { frames })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the reel has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame for a local (clip-relative) index; the reel loops.
    pub fn frame(&self, local: u32) -> Option<&Surface> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames.get(local as usize % self.frames.len())
    }
}

/// Descriptive warning for a reel that could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReelLoadWarning {
    /// Sub-routine that stays unloaded.
    pub sub_routine: SubRoutineId,
    /// Display name of the sub-routine.
    pub name: String,
    /// Format version of a legacy reference, when known.
    pub format_version: Option<u32>,
    /// Why resolution failed.
    pub reason: String,
}

impl std::fmt::Display for ReelLoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.format_version {
            Some(v) => write!(
                f,
                "sub-routine '{}' (format v{v}) could not be loaded: {}",
                self.name, self.reason
            ),
            None => write!(
                f,
                "sub-routine '{}' could not be loaded: {}",
                self.name, self.reason
            ),
        }
    }
}

/// Resolved per-frame transform of a sub-routine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubRoutineTransform {
    /// Top-left placement in canvas pixels.
    pub position: Vec2,
    /// Scale per axis.
    pub scale: Vec2,
    /// Rotation in degrees. Resolved and stored, never applied to pixels.
    pub rotation: f64,
}

impl Default for SubRoutineTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }
}

/// An independently timed reel placed on the parent timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubRoutine {
    #[serde(default)]
    id: SubRoutineId,
    /// Display name.
    pub name: String,
    start_frame: u32,
    duration_frames: u32,
    /// Disabled sub-routines are kept but never drawn.
    pub enabled: bool,
    /// Paint rank against layers and other sub-routines; higher draws later.
    pub z_order: i32,
    /// Easing applied between channel keys.
    #[serde(default)]
    pub easing: Ease,
    /// Position keys over normalized time.
    #[serde(default)]
    pub position: Channel<Vec2>,
    /// Scale keys over normalized time.
    #[serde(default)]
    pub scale: Channel<Vec2>,
    /// Rotation keys over normalized time.
    #[serde(default)]
    pub rotation: Channel<f64>,
    source: ReelSource,
    #[serde(skip)]
    reel: Option<Reel>,
}

impl SubRoutine {
    /// New enabled sub-routine at z-order 0 with no channel keys.
    pub fn new(
        name: impl Into<String>,
        start_frame: u32,
        duration_frames: u32,
        source: ReelSource,
    ) -> PixreelResult<Self> {
        if duration_frames == 0 {
            return Err(PixreelError::validation(
                "sub-routine duration must be at least one frame",
            ));
        }
        Ok(Self {
            id: SubRoutineId::default(),
            name: name.into(),
            start_frame,
            duration_frames,
            enabled: true,
            z_order: 0,
            easing: Ease::Linear,
            position: Channel::new(),
            scale: Channel::new(),
            rotation: Channel::new(),
            source,
            reel: None,
        })
    }

    /// Stable id, assigned by [`SubRoutineCollection::add`].
    pub fn id(&self) -> SubRoutineId {
        self.id
    }

    /// Where the reel's frames come from.
    pub fn source(&self) -> &ReelSource {
        &self.source
    }

    /// Swap the reel reference and resolve it through `resolver`.
    ///
    /// Previously resolved pixels are dropped first, so a failed resolution
    /// leaves the sub-routine unloaded.
    pub fn set_source(
        &mut self,
        source: ReelSource,
        resolver: &dyn ReelResolver,
    ) -> Option<ReelLoadWarning> {
        self.source = source;
        self.unload_reel();
        self.load_reel(resolver)
    }

    /// First frame covered.
    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    /// Number of frames covered (always at least one).
    pub fn duration_frames(&self) -> u32 {
        self.duration_frames
    }

    /// One past the last frame covered.
    pub fn end_frame(&self) -> u32 {
        self.start_frame.saturating_add(self.duration_frames)
    }

    /// Covered frames as a range.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange {
            start: self.start_frame,
            end: self.end_frame(),
        }
    }

    /// `true` when `frame` lies in `[start, end)`.
    pub fn is_active_at(&self, frame: u32) -> bool {
        self.frame_range().contains(frame)
    }

    /// Set the start frame, keeping the duration.
    pub fn set_start_frame(&mut self, start: u32) {
        self.start_frame = start;
    }

    /// Set the duration; zero is rejected.
    pub fn set_duration_frames(&mut self, duration: u32) -> PixreelResult<()> {
        if duration == 0 {
            return Err(PixreelError::validation(
                "sub-routine duration must be at least one frame",
            ));
        }
        self.duration_frames = duration;
        Ok(())
    }

    /// Left-handle drag: moves the start while the end stays put.
    ///
    /// Clamps so that the start never goes below zero and at least one frame
    /// remains. Returns `true` when anything changed.
    pub fn drag_left_handle(&mut self, delta: i64) -> bool {
        let end = i64::from(self.end_frame());
        let start = (i64::from(self.start_frame) + delta).clamp(0, end - 1);
        let changed = start != i64::from(self.start_frame);
        self.start_frame = start as u32;
        self.duration_frames = (end - start) as u32;
        changed
    }

    /// Right-handle drag: changes only the duration (minimum one frame).
    pub fn drag_right_handle(&mut self, delta: i64) -> bool {
        let max = i64::from(u32::MAX - self.start_frame);
        let duration = (i64::from(self.duration_frames) + delta).clamp(1, max.max(1));
        let changed = duration != i64::from(self.duration_frames);
        self.duration_frames = duration as u32;
        changed
    }

    /// Body drag: moves the whole clip, start clamped at zero.
    pub fn drag_body(&mut self, delta: i64) -> bool {
        let max = i64::from(u32::MAX - self.duration_frames);
        let start = (i64::from(self.start_frame) + delta).clamp(0, max);
        let changed = start != i64::from(self.start_frame);
        self.start_frame = start as u32;
        changed
    }

    /// Normalized time of `frame` within the clip, clamped to `[0, 1]`.
    pub fn normalized_time(&self, frame: u32) -> f64 {
        let t = (f64::from(frame) - f64::from(self.start_frame)) / f64::from(self.duration_frames);
        t.clamp(0.0, 1.0)
    }

    /// Resolve all channels at absolute `frame`. Empty channels are identity.
    pub fn resolve_transform(&self, frame: u32) -> SubRoutineTransform {
        let t = self.normalized_time(frame);
        let identity = SubRoutineTransform::default();
        SubRoutineTransform {
            position: self.position.sample(t, self.easing).unwrap_or(identity.position),
            scale: self.scale.sample(t, self.easing).unwrap_or(identity.scale),
            rotation: self.rotation.sample(t, self.easing).unwrap_or(identity.rotation),
        }
    }

    /// `true` once the reel's pixels are resolved.
    pub fn is_loaded(&self) -> bool {
        self.reel.is_some()
    }

    /// `true` when the reel is stored inline.
    pub fn has_embedded_pixels(&self) -> bool {
        self.source.has_embedded_pixels()
    }

    /// Resolved reel, when loaded.
    pub fn reel(&self) -> Option<&Reel> {
        self.reel.as_ref()
    }

    /// Reel frame shown at absolute `frame`, when active and loaded.
    pub fn frame_pixels(&self, frame: u32) -> Option<&Surface> {
        if !self.is_active_at(frame) {
            return None;
        }
        self.reel.as_ref()?.frame(frame - self.start_frame)
    }

    /// Resolve the reel through `resolver`.
    ///
    /// Failure never propagates: the sub-routine stays in place, unloaded, and a
    /// warning describing the cause is returned.
    pub fn load_reel(&mut self, resolver: &dyn ReelResolver) -> Option<ReelLoadWarning> {
        match resolver.resolve(&self.source) {
            Ok(reel) => {
                self.reel = Some(reel);
                None
            }
            Err(err) => {
                self.reel = None;
                let warning = ReelLoadWarning {
                    sub_routine: self.id,
                    name: self.name.clone(),
                    format_version: self.source.format_version(),
                    reason: err.to_string(),
                };
                tracing::warn!(%warning, "sub-routine reel unresolved");
                Some(warning)
            }
        }
    }

    /// Drop resolved pixels.
    pub fn unload_reel(&mut self) {
        self.reel = None;
    }

    pub(crate) fn normalize(&mut self) {
        self.duration_frames = self.duration_frames.max(1);
        self.position.normalize();
        self.scale.normalize();
        self.rotation.normalize();
    }
}

/// Sub-routines in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubRoutineCollection {
    items: Vec<SubRoutine>,
    next_id: u64,
}

impl SubRoutineCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append, assigning a fresh id.
    pub fn add(&mut self, mut sub: SubRoutine) -> SubRoutineId {
        self.next_id = self
            .next_id
            .max(self.items.iter().map(|s| s.id.0).max().unwrap_or(0))
            + 1;
        sub.id = SubRoutineId(self.next_id);
        let id = sub.id;
        self.items.push(sub);
        id
    }

    /// Restore a deserialized sub-routine, keeping its id when unused.
    pub(crate) fn restore(&mut self, mut sub: SubRoutine) -> SubRoutineId {
        sub.normalize();
        if sub.id.0 == 0 || self.get(sub.id).is_some() {
            return self.add(sub);
        }
        self.next_id = self.next_id.max(sub.id.0);
        let id = sub.id;
        self.items.push(sub);
        id
    }

    /// Remove by id.
    pub fn remove(&mut self, id: SubRoutineId) -> Option<SubRoutine> {
        let idx = self.items.iter().position(|s| s.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Lookup by id.
    pub fn get(&self, id: SubRoutineId) -> Option<&SubRoutine> {
        self.items.iter().find(|s| s.id == id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: SubRoutineId) -> Option<&mut SubRoutine> {
        self.items.iter_mut().find(|s| s.id == id)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SubRoutine> {
        self.items.iter()
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SubRoutine> {
        self.items.iter_mut()
    }

    /// Number of sub-routines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Enabled, loaded sub-routines covering `frame`, in insertion order.
    pub fn renderable_at(&self, frame: u32) -> impl Iterator<Item = &SubRoutine> {
        self.items
            .iter()
            .filter(move |s| s.enabled && s.is_loaded() && s.is_active_at(frame))
    }

    /// Resolve every reel, collecting warnings for the ones that fail.
    pub fn load_all(&mut self, resolver: &dyn ReelResolver) -> Vec<ReelLoadWarning> {
        self.items
            .iter_mut()
            .filter_map(|s| s.load_reel(resolver))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/subroutine.rs"]
mod tests;

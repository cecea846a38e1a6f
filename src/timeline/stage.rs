use crate::{
    animation::keyframes::KeyframeTrack,
    foundation::core::{Canvas, Vec2},
    foundation::error::{PixreelError, PixreelResult},
    foundation::math::Lerp,
    render::sample::ScalingAlgorithm,
};

/// How camera dragging is clamped against the canvas (UI concern only).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BoundsMode {
    /// No clamping.
    #[default]
    Free,
    /// Capture rectangle stays inside the canvas.
    Constrained,
    /// Capture center stays inside the canvas.
    CenterLocked,
}

/// Static stage (virtual camera) configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stage {
    /// When `false`, frames are rendered at native canvas size.
    pub enabled: bool,
    /// Left edge of the default capture rectangle, canvas pixels.
    pub stage_x: i32,
    /// Top edge of the default capture rectangle, canvas pixels.
    pub stage_y: i32,
    /// Width of the default capture rectangle.
    pub stage_width: u32,
    /// Height of the default capture rectangle.
    pub stage_height: u32,
    /// Output buffer width.
    pub output_width: u32,
    /// Output buffer height.
    pub output_height: u32,
    /// Filter used to map the capture rectangle to the output.
    #[serde(default)]
    pub scaling: ScalingAlgorithm,
    /// Camera drag clamping.
    #[serde(default)]
    pub bounds_mode: BoundsMode,
}

impl Stage {
    /// Disabled stage covering `canvas` one-to-one.
    pub fn for_canvas(canvas: Canvas) -> Self {
        Self {
            enabled: false,
            stage_x: 0,
            stage_y: 0,
            stage_width: canvas.width,
            stage_height: canvas.height,
            output_width: canvas.width,
            output_height: canvas.height,
            scaling: ScalingAlgorithm::default(),
            bounds_mode: BoundsMode::default(),
        }
    }

    /// Reject degenerate rectangles.
    pub fn validate(&self) -> PixreelResult<()> {
        if self.stage_width == 0 || self.stage_height == 0 {
            return Err(PixreelError::validation("stage size must be non-zero"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(PixreelError::validation("stage output size must be non-zero"));
        }
        Ok(())
    }

    /// Output dimensions.
    pub fn output(&self) -> Canvas {
        Canvas {
            width: self.output_width,
            height: self.output_height,
        }
    }

    /// The static capture rectangle used when the stage track has no keyframes.
    pub fn static_rect(&self) -> CaptureRect {
        CaptureRect {
            x: f64::from(self.stage_x),
            y: f64::from(self.stage_y),
            width: f64::from(self.stage_width),
            height: f64::from(self.stage_height),
        }
    }

    /// Snapshot equivalent to the static rectangle, useful as a first keyframe.
    pub fn static_snapshot(&self) -> StageSnapshot {
        let r = self.static_rect();
        StageSnapshot {
            position: Vec2::new(r.x + r.width / 2.0, r.y + r.height / 2.0),
            scale: Vec2::new(
                f64::from(self.output_width) / r.width.max(1.0),
                f64::from(self.output_height) / r.height.max(1.0),
            ),
            rotation: 0.0,
        }
    }

    /// Capture rectangle for a resolved snapshot, or the static rectangle.
    ///
    /// Position is the capture center; scale divides the output size.
    pub fn capture_rect(&self, snapshot: Option<&StageSnapshot>) -> CaptureRect {
        let Some(s) = snapshot else {
            return self.static_rect();
        };
        let width = f64::from(self.output_width) / sanitize_scale(s.scale.x);
        let height = f64::from(self.output_height) / sanitize_scale(s.scale.y);
        CaptureRect {
            x: s.position.x - width / 2.0,
            y: s.position.y - height / 2.0,
            width,
            height,
        }
    }

    /// Apply [`BoundsMode`] to a proposed capture center.
    pub fn clamp_center(&self, center: Vec2, scale: Vec2, canvas: Canvas) -> Vec2 {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        match self.bounds_mode {
            BoundsMode::Free => center,
            BoundsMode::CenterLocked => Vec2::new(center.x.clamp(0.0, cw), center.y.clamp(0.0, ch)),
            BoundsMode::Constrained => {
                let half_w = f64::from(self.output_width) / sanitize_scale(scale.x) / 2.0;
                let half_h = f64::from(self.output_height) / sanitize_scale(scale.y) / 2.0;
                Vec2::new(
                    clamp_axis(center.x, half_w, cw),
                    clamp_axis(center.y, half_h, ch),
                )
            }
        }
    }
}

fn sanitize_scale(s: f64) -> f64 {
    if s.is_finite() && s > 0.0 { s } else { 1.0 }
}

fn clamp_axis(c: f64, half: f64, extent: f64) -> f64 {
    if half * 2.0 >= extent {
        return extent / 2.0;
    }
    c.clamp(half, extent - half)
}

/// Camera state stored in a stage keyframe.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageSnapshot {
    /// Capture center in canvas pixels.
    pub position: Vec2,
    /// Zoom factor per axis; capture size is `output / scale`.
    pub scale: Vec2,
    /// Rotation in radians (interpolated, not rendered).
    #[serde(default)]
    pub rotation: f64,
}

impl Lerp for StageSnapshot {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            position: <Vec2 as Lerp>::lerp(&a.position, &b.position, t),
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            rotation: a.rotation + (b.rotation - a.rotation) * t,
        }
    }
}

/// Source rectangle in canvas pixels, top-left based.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Stage keyframes with continuous (linear) interpolation.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageTrack {
    /// Camera keyframes.
    pub keyframes: KeyframeTrack<StageSnapshot>,
}

impl StageTrack {
    /// Resolved camera state at `frame`; `None` when the track is empty.
    ///
    /// Frames outside the keyed range take the nearest keyframe unmodified.
    pub fn resolve(&self, frame: u32) -> Option<StageSnapshot> {
        self.keyframes.sample_linear(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/stage.rs"]
mod tests;

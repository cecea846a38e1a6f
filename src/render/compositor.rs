use crate::{
    document::model::{LayerDocument, LayerId, LayerInfo, LayerOverrides},
    foundation::core::{Canvas, FrameRange, Vec2},
    foundation::error::{PixreelError, PixreelResult},
    render::sample::{draw_scaled_nearest, sample_rect},
    render::surface::Surface,
    state::animation::CanvasAnimationState,
    timeline::stage::CaptureRect,
    timeline::subroutine::SubRoutine,
    timeline::zorder::{self, ZItem},
};

/// Renders timeline frames from an animation and its document.
///
/// Nothing is cached; every call resolves the frame from scratch.
pub struct FrameCompositor<'a> {
    state: &'a CanvasAnimationState,
    doc: &'a dyn LayerDocument,
}

enum Pass<'s> {
    Layers(Vec<LayerId>),
    Sub(&'s SubRoutine),
}

impl<'a> FrameCompositor<'a> {
    /// Compositor over `state` and the document it animates.
    pub fn new(state: &'a CanvasAnimationState, doc: &'a dyn LayerDocument) -> Self {
        Self { state, doc }
    }

    /// Size of rendered frames: the stage output when enabled, else the canvas.
    pub fn output_canvas(&self) -> Canvas {
        let stage = self.state.stage();
        if stage.enabled {
            stage.output()
        } else {
            self.doc.canvas()
        }
    }

    /// Render one frame.
    ///
    /// Layers resolve their keyframed state, the stage samples its capture
    /// rectangle, and active sub-routines are painted in Z-order. Layers and
    /// sub-routines interleave when sub-routine ranks fall between layers.
    /// Unloaded or disabled sub-routines are skipped.
    #[tracing::instrument(skip(self))]
    pub fn render_frame(&self, frame: u32) -> PixreelResult<Surface> {
        let state = self.state;
        if frame >= state.frame_count() {
            return Err(PixreelError::render(format!(
                "frame {frame} is outside [0, {})",
                state.frame_count()
            )));
        }
        let stage = state.stage();
        stage.validate()?;
        let capture = stage.enabled.then(|| state.capture_rect(frame));
        let out_canvas = self.output_canvas();

        let mut overrides = LayerOverrides::new();
        for track in state.layer_tracks() {
            if let Some(snapshot) = track.resolve(frame) {
                overrides.set(track.layer_id, snapshot);
            }
        }

        let layers = self.doc.flattened_layers();
        let mut out: Option<Surface> = None;
        for pass in self.passes(&layers, frame) {
            match pass {
                Pass::Layers(run) => {
                    let mut run_overrides = overrides.clone();
                    for l in &layers {
                        if !run.contains(&l.id) {
                            run_overrides.exclude(l.id);
                        }
                    }
                    let pixels = self.flatten(&run_overrides, capture, out_canvas)?;
                    match out.as_mut() {
                        None => out = Some(pixels),
                        Some(dst) => pixels.composite_to(dst, 0, 0, 1.0),
                    }
                }
                Pass::Sub(sub) => {
                    let Some(reel_frame) = sub.frame_pixels(frame) else {
                        continue;
                    };
                    let transform = sub.resolve_transform(frame);
                    let origin = match capture {
                        Some(r) => transform.position - Vec2::new(r.x, r.y),
                        None => transform.position,
                    };
                    let dst = out
                        .get_or_insert_with(|| Surface::new(out_canvas.width, out_canvas.height));
                    draw_scaled_nearest(dst, reel_frame, origin, transform.scale);
                }
            }
        }
        Ok(out.unwrap_or_else(|| Surface::new(out_canvas.width, out_canvas.height)))
    }

    /// Render every frame of `range` in order, handing each to `sink`.
    pub fn render_range(
        &self,
        range: FrameRange,
        mut sink: impl FnMut(u32, Surface) -> PixreelResult<()>,
    ) -> PixreelResult<()> {
        for frame in range.start..range.end {
            sink(frame, self.render_frame(frame)?)?;
        }
        Ok(())
    }

    // Paint order grouped into contiguous layer runs and single sub-routines.
    fn passes(&self, layers: &[LayerInfo], frame: u32) -> Vec<Pass<'a>> {
        let state: &'a CanvasAnimationState = self.state;
        let subs = state.sub_routines();
        let mut passes: Vec<Pass<'a>> = Vec::new();
        for entry in zorder::paint_order(layers, subs) {
            match entry.item {
                ZItem::Layer { id, .. } => match passes.last_mut() {
                    Some(Pass::Layers(run)) => run.push(id),
                    _ => passes.push(Pass::Layers(vec![id])),
                },
                ZItem::SubRoutine(id) => {
                    if let Some(sub) = subs.renderable_at(frame).find(|s| s.id() == id) {
                        passes.push(Pass::Sub(sub));
                    }
                }
            }
        }
        passes
    }

    fn flatten(
        &self,
        overrides: &LayerOverrides<'_>,
        capture: Option<CaptureRect>,
        out_canvas: Canvas,
    ) -> PixreelResult<Surface> {
        let canvas = self.doc.canvas();
        let mut flat = Surface::new(canvas.width, canvas.height);
        self.doc.composite_to(&mut flat, overrides)?;
        Ok(match capture {
            Some(rect) => sample_rect(
                &flat,
                rect,
                out_canvas.width,
                out_canvas.height,
                self.state.stage().scaling,
            ),
            None => flat,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

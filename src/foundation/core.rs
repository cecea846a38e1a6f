use crate::foundation::error::{PixreelError, PixreelResult};

pub use kurbo::Vec2;

/// Half-open range of timeline frames `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// First frame in the range.
    pub start: u32,
    /// One past the last frame in the range.
    pub end: u32, // exclusive
}

impl FrameRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: u32, end: u32) -> PixreelResult<Self> {
        if start > end {
            return Err(PixreelError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames covered.
    pub fn len_frames(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// `true` when the range covers no frame.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// `true` when `f` lies in `[start, end)`.
    pub fn contains(self, f: u32) -> bool {
        self.start <= f && f < self.end
    }

    /// Clamp `f` into the range (inclusive of the last frame).
    pub fn clamp(self, f: u32) -> u32 {
        if self.is_empty() {
            return self.start;
        }
        f.clamp(self.start, self.end - 1)
    }

    /// Clip a signed span `[start, end)` to `[0, frame_count)`.
    ///
    /// Returns `None` when nothing of the span is visible.
    pub fn clip_signed(start: i64, end: i64, frame_count: u32) -> Option<Self> {
        let lo = start.max(0);
        let hi = end.min(i64::from(frame_count));
        if lo >= hi {
            return None;
        }
        Some(Self {
            start: lo as u32,
            end: hi as u32,
        })
    }
}

/// Pixel dimensions of a canvas or output buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

use std::collections::BTreeMap;

use crate::foundation::{
    error::{PixreelError, PixreelResult},
    math::Lerp,
};

/// Ordered mapping from frame index to a typed snapshot.
///
/// Keys are unique and always iterate in ascending frame order. Keyframes at or
/// beyond the owner's current frame count are retained; they are simply not
/// reachable until the frame count grows again.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct KeyframeTrack<S> {
    keys: BTreeMap<u32, S>,
}

impl<S> Default for KeyframeTrack<S> {
    fn default() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }
}

/// Keyframes surrounding a query frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bracket<'a, S> {
    /// The track has no keyframes.
    Empty,
    /// The query is at or before the first keyframe.
    First(&'a S),
    /// The query is at or after the last keyframe.
    Last(&'a S),
    /// The query lies inside the keyed range, `k0 <= frame < k1`.
    Between {
        /// Frame of the lower keyframe.
        k0: u32,
        /// Snapshot of the lower keyframe.
        a: &'a S,
        /// Frame of the upper keyframe.
        k1: u32,
        /// Snapshot of the upper keyframe.
        b: &'a S,
    },
}

impl<S> KeyframeTrack<S> {
    /// Empty track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the keyframe at `frame`, returning the replaced snapshot.
    pub fn set_keyframe(&mut self, frame: u32, snapshot: S) -> Option<S> {
        self.keys.insert(frame, snapshot)
    }

    /// Remove the keyframe at `frame`, if any.
    pub fn remove_keyframe_at(&mut self, frame: u32) -> Option<S> {
        self.keys.remove(&frame)
    }

    /// Move the keyframe at `from` to `to`.
    ///
    /// Returns `Ok(false)` when `from` holds no keyframe. Targets outside
    /// `[0, frame_count)` and targets already holding a keyframe are rejected and
    /// the track is left unchanged.
    pub fn move_keyframe(&mut self, from: u32, to: u32, frame_count: u32) -> PixreelResult<bool> {
        if !self.keys.contains_key(&from) {
            return Ok(false);
        }
        if to >= frame_count {
            return Err(PixreelError::keyframe(format!(
                "cannot move keyframe {from} to {to}: outside [0, {frame_count})"
            )));
        }
        if from == to {
            return Ok(true);
        }
        if self.keys.contains_key(&to) {
            return Err(PixreelError::keyframe(format!(
                "cannot move keyframe {from} to {to}: target frame is occupied"
            )));
        }
        if let Some(snapshot) = self.keys.remove(&from) {
            self.keys.insert(to, snapshot);
        }
        Ok(true)
    }

    /// `true` when a keyframe is stored exactly at `frame`.
    pub fn has_keyframe_at(&self, frame: u32) -> bool {
        self.keys.contains_key(&frame)
    }

    /// Snapshot stored exactly at `frame`.
    pub fn keyframe_at(&self, frame: u32) -> Option<&S> {
        self.keys.get(&frame)
    }

    /// Mutable snapshot stored exactly at `frame`.
    pub fn keyframe_at_mut(&mut self, frame: u32) -> Option<&mut S> {
        self.keys.get_mut(&frame)
    }

    /// Keyframe frames in ascending order.
    pub fn keyframe_indices(&self) -> Vec<u32> {
        self.keys.keys().copied().collect()
    }

    /// Keyframe frames that lie at or beyond `frame_count`.
    pub fn orphaned_indices(&self, frame_count: u32) -> Vec<u32> {
        self.keys.range(frame_count..).map(|(k, _)| *k).collect()
    }

    /// Iterate `(frame, snapshot)` pairs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &S)> {
        self.keys.iter().map(|(k, v)| (*k, v))
    }

    /// Number of stored keyframes.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when no keyframe is stored.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Remove every keyframe.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Greatest keyframe at or before `frame` (step/hold lookup).
    pub fn hold_at(&self, frame: u32) -> Option<(u32, &S)> {
        self.keys.range(..=frame).next_back().map(|(k, v)| (*k, v))
    }

    /// Locate the keyframes surrounding `frame`.
    pub fn bracket(&self, frame: u32) -> Bracket<'_, S> {
        let (Some((&first, first_v)), Some((&last, last_v))) =
            (self.keys.first_key_value(), self.keys.last_key_value())
        else {
            return Bracket::Empty;
        };
        if frame <= first {
            return Bracket::First(first_v);
        }
        if frame >= last {
            return Bracket::Last(last_v);
        }
        match (
            self.keys.range(..=frame).next_back(),
            self.keys.range(frame + 1..).next(),
        ) {
            (Some((&k0, a)), Some((&k1, b))) => Bracket::Between { k0, a, k1, b },
            _ => Bracket::Last(last_v),
        }
    }
}

impl<S> KeyframeTrack<S>
where
    S: Lerp + Clone,
{
    /// Linearly interpolated snapshot at `frame`, clamped to the keyed range.
    ///
    /// Returns `None` only when the track is empty.
    pub fn sample_linear(&self, frame: u32) -> Option<S> {
        match self.bracket(frame) {
            Bracket::Empty => None,
            Bracket::First(v) | Bracket::Last(v) => Some(v.clone()),
            Bracket::Between { k0, a, k1, b } => {
                let denom = k1.saturating_sub(k0);
                if denom == 0 {
                    return Some(a.clone());
                }
                let t = f64::from(frame - k0) / f64::from(denom);
                Some(S::lerp(a, b, t))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframes.rs"]
mod tests;

use crate::{animation::ease::Ease, foundation::math::Lerp};

/// Two normalized times closer than this address the same key.
pub const TIME_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One key of a normalized-time channel.
pub struct ChannelKey<T> {
    /// Normalized time in `[0, 1]` within the owner's duration.
    pub time: f64,
    /// Keyed value.
    pub value: T,
}

/// Keyframes addressed by normalized time instead of absolute frames.
///
/// Used by sub-routines, whose channels stretch with the clip duration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Channel<T> {
    keys: Vec<ChannelKey<T>>, // sorted by time
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T> Channel<T> {
    /// Empty channel (contributes an identity transform).
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the key at `time` (clamped to `[0, 1]`).
    pub fn set_key(&mut self, time: f64, value: T) {
        let time = if time.is_finite() {
            time.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if let Some(existing) = self
            .keys
            .iter_mut()
            .find(|k| (k.time - time).abs() < TIME_EPSILON)
        {
            existing.value = value;
            return;
        }
        let idx = self.keys.partition_point(|k| k.time < time);
        self.keys.insert(idx, ChannelKey { time, value });
    }

    /// Remove the key at `time`, returning its value.
    pub fn remove_key(&mut self, time: f64) -> Option<T> {
        let idx = self
            .keys
            .iter()
            .position(|k| (k.time - time).abs() < TIME_EPSILON)?;
        Some(self.keys.remove(idx).value)
    }

    /// Keys in ascending time order.
    pub fn keys(&self) -> &[ChannelKey<T>] {
        &self.keys
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when the channel has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Restore ascending order after deserialization.
    pub fn normalize(&mut self) {
        self.keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.keys
            .dedup_by(|later, earlier| (later.time - earlier.time).abs() < TIME_EPSILON);
    }
}

impl<T> Channel<T>
where
    T: Lerp + Clone,
{
    /// Value at normalized time `t`, or `None` for an empty channel.
    ///
    /// `ease` shapes the progress between the two bracketing keys.
    pub fn sample(&self, t: f64, ease: Ease) -> Option<T> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        let t = t.clamp(0.0, 1.0);
        if self.keys.len() == 1 || t <= first.time {
            return Some(first.value.clone());
        }
        if t >= last.time {
            return Some(last.value.clone());
        }

        let idx = self.keys.partition_point(|k| k.time <= t);
        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let span = b.time - a.time;
        if span <= 0.0 {
            return Some(a.value.clone());
        }
        let local = (t - a.time) / span;
        Some(T::lerp(&a.value, &b.value, ease.apply(local)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/channel.rs"]
mod tests;

use std::mem::discriminant;

use crate::{
    audio::track::AudioTrackId, document::model::LayerId, state::playback::PlaybackState,
};

/// Keyframe track addressed by a [`AnimationEvent::KeyframeChanged`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackRef {
    /// Layer track of a document layer.
    Layer(LayerId),
    /// The stage (camera) track.
    Stage,
}

/// Change notifications of a [`crate::CanvasAnimationState`].
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEvent {
    /// Current frame moved (new index).
    CurrentFrameChanged(u32),
    /// Frame count changed (new count).
    FrameCountChanged(u32),
    /// Frame rate changed (new FPS).
    FpsChanged(u32),
    /// Playback state changed (new state).
    PlaybackStateChanged(PlaybackState),
    /// Layer tracks were added, removed or renamed.
    TracksChanged,
    /// A keyframe was inserted, removed, moved or edited.
    KeyframeChanged {
        /// Track that changed.
        track: TrackRef,
        /// Affected frame.
        frame: u32,
    },
    /// Static stage configuration changed.
    StageSettingsChanged,
    /// Audio tracks or their settings changed.
    AudioTracksChanged,
    /// Sub-routines changed.
    SubRoutinesChanged,
    /// A background waveform decode was applied.
    WaveformUpdated(AudioTrackId),
}

impl AnimationEvent {
    // Value-carrying state events: only the latest value matters.
    fn is_state_change(&self) -> bool {
        matches!(
            self,
            Self::CurrentFrameChanged(_)
                | Self::FrameCountChanged(_)
                | Self::FpsChanged(_)
                | Self::PlaybackStateChanged(_)
        )
    }
}

/// Handle returned by [`EventHub::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&AnimationEvent)>;

/// Synchronous listener registry with batch scopes.
///
/// Outside a batch every event is delivered immediately. Inside a batch
/// events are queued and coalesced, then delivered once when the outermost
/// batch ends.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    depth: u32,
    pending: Vec<AnimationEvent>,
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.len())
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .finish()
    }
}

impl EventHub {
    /// Registry without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; called in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&AnimationEvent) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns `false` when unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        before != self.listeners.len()
    }

    /// Deliver or queue `event`.
    pub fn emit(&mut self, event: AnimationEvent) {
        if self.depth == 0 {
            self.dispatch(&event);
            return;
        }
        if event.is_state_change() {
            if let Some(slot) = self
                .pending
                .iter_mut()
                .find(|e| discriminant(&**e) == discriminant(&event))
            {
                *slot = event;
                return;
            }
        } else if self.pending.contains(&event) {
            return;
        }
        self.pending.push(event);
    }

    /// `true` inside a batch scope.
    pub fn in_batch(&self) -> bool {
        self.depth > 0
    }

    pub(crate) fn begin_batch(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn end_batch(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            for event in std::mem::take(&mut self.pending) {
                self.dispatch(&event);
            }
        }
    }

    fn dispatch(&mut self, event: &AnimationEvent) {
        tracing::trace!(?event, "animation event");
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/events.rs"]
mod tests;

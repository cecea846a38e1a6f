use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    assets::reel::{EmbeddedReelResolver, ReelResolver},
    audio::collection::{AudioTrackCollection, WaveformEvent},
    audio::track::{AudioTrack, AudioTrackId},
    document::model::{LayerDocument, LayerId},
    foundation::core::Canvas,
    foundation::error::{PixreelError, PixreelResult},
    state::events::{AnimationEvent, EventHub, ListenerId, TrackRef},
    state::playback::{Direction, LoopMode, PlaybackClock, PlaybackState, step},
    timeline::layer_track::{LayerSnapshot, LayerTrack},
    timeline::stage::{CaptureRect, Stage, StageSnapshot, StageTrack},
    timeline::subroutine::{ReelLoadWarning, SubRoutine, SubRoutineCollection, SubRoutineId},
    timeline::zorder::{self, ZEntry},
};

/// Frame count of a fresh animation.
pub const DEFAULT_FRAME_COUNT: u32 = 24;
/// Frame rate of a fresh animation.
pub const DEFAULT_FPS: u32 = 12;

/// Onion skin display settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OnionSkin {
    /// Show neighbour frames while editing.
    pub enabled: bool,
    /// Frames shown before the current one.
    pub frames_before: u32,
    /// Frames shown after the current one.
    pub frames_after: u32,
    /// Opacity of the nearest neighbour; farther frames fade linearly.
    pub opacity: f32,
}

impl Default for OnionSkin {
    fn default() -> Self {
        Self {
            enabled: false,
            frames_before: 1,
            frames_after: 1,
            opacity: 0.5,
        }
    }
}

/// A neighbour frame drawn as an onion skin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnionFrame {
    /// Timeline frame.
    pub frame: u32,
    /// Signed distance from the current frame.
    pub offset: i64,
    /// Display opacity.
    pub opacity: f32,
}

/// The animation model of one canvas: tracks, timing and transport.
///
/// Every mutation goes through this type so that change notifications fire
/// exactly once per edit (or once per [`Self::batch`]).
#[derive(Debug)]
pub struct CanvasAnimationState {
    pub(crate) frame_count: u32,
    pub(crate) fps: u32,
    pub(crate) current_frame: u32,
    pub(crate) looping: bool,
    pub(crate) ping_pong: bool,
    pub(crate) auto_keyframe: bool,
    pub(crate) onion_skin: OnionSkin,
    playback: PlaybackState,
    direction: Direction,
    clock: PlaybackClock,
    pub(crate) layer_tracks: Vec<LayerTrack>, // document order, bottom to top
    pub(crate) stage: Stage,
    pub(crate) stage_track: StageTrack,
    pub(crate) sub_routines: SubRoutineCollection,
    pub(crate) audio: AudioTrackCollection,
    events: EventHub,
}

impl CanvasAnimationState {
    /// Empty animation for a canvas, with a disabled stage covering it.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            fps: DEFAULT_FPS,
            current_frame: 0,
            looping: true,
            ping_pong: false,
            auto_keyframe: false,
            onion_skin: OnionSkin::default(),
            playback: PlaybackState::Stopped,
            direction: Direction::Forward,
            clock: PlaybackClock::default(),
            layer_tracks: Vec::new(),
            stage: Stage::for_canvas(canvas),
            stage_track: StageTrack::default(),
            sub_routines: SubRoutineCollection::new(),
            audio: AudioTrackCollection::new(),
            events: EventHub::new(),
        }
    }

    // ---- notifications ----

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&AnimationEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Remove a change listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Run several edits as one: listeners see each distinct change once,
    /// after `f` returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.events.begin_batch();
        let out = f(self);
        self.events.end_batch();
        out
    }

    fn emit(&mut self, event: AnimationEvent) {
        self.events.emit(event);
    }

    // ---- timing ----

    /// Number of frames (at least one).
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Frames per second (at least one).
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Frame shown in the editor, always `< frame_count`.
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Change the frame count. Keyframes past the new end are kept.
    pub fn set_frame_count(&mut self, frame_count: u32) -> PixreelResult<()> {
        if frame_count == 0 {
            return Err(PixreelError::validation("frame count must be at least 1"));
        }
        if frame_count == self.frame_count {
            return Ok(());
        }
        self.batch(|s| {
            s.frame_count = frame_count;
            s.emit(AnimationEvent::FrameCountChanged(frame_count));
            let clamped = s.current_frame.min(frame_count - 1);
            s.move_to(clamped);
        });
        Ok(())
    }

    /// Change the frame rate.
    pub fn set_fps(&mut self, fps: u32) -> PixreelResult<()> {
        if fps == 0 {
            return Err(PixreelError::validation("frame rate must be at least 1"));
        }
        if fps != self.fps {
            self.fps = fps;
            self.clock.reset();
            self.emit(AnimationEvent::FpsChanged(fps));
        }
        Ok(())
    }

    /// Jump to `frame`, clamped into `[0, frame_count)`.
    pub fn set_current_frame(&mut self, frame: u32) {
        self.move_to(frame.min(self.frame_count - 1));
    }

    /// Step forward; wraps to 0 when looping, otherwise holds at the end.
    pub fn next_frame(&mut self) {
        let last = self.frame_count - 1;
        let target = match self.current_frame {
            f if f < last => f + 1,
            _ if self.looping => 0,
            f => f,
        };
        self.move_to(target);
    }

    /// Step back; wraps to the last frame when looping.
    pub fn previous_frame(&mut self) {
        let target = match self.current_frame {
            0 if self.looping => self.frame_count - 1,
            0 => 0,
            f => f - 1,
        };
        self.move_to(target);
    }

    /// Jump to frame 0.
    pub fn first_frame(&mut self) {
        self.move_to(0);
    }

    /// Jump to the last frame.
    pub fn last_frame(&mut self) {
        self.move_to(self.frame_count - 1);
    }

    fn move_to(&mut self, frame: u32) {
        if frame != self.current_frame {
            self.current_frame = frame;
            self.emit(AnimationEvent::CurrentFrameChanged(frame));
        }
    }

    /// Whether playback wraps at the end.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable wrapping.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Whether playback bounces between the ends.
    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    /// Enable or disable bouncing; turning it off resumes forward travel.
    pub fn set_ping_pong(&mut self, ping_pong: bool) {
        self.ping_pong = ping_pong;
        if !ping_pong {
            self.direction = Direction::Forward;
        }
    }

    /// Whether layer edits create keyframes at the current frame.
    pub fn is_auto_keyframe(&self) -> bool {
        self.auto_keyframe
    }

    /// Enable or disable auto-keyframing.
    pub fn set_auto_keyframe(&mut self, auto_keyframe: bool) {
        self.auto_keyframe = auto_keyframe;
    }

    /// Onion skin settings.
    pub fn onion_skin(&self) -> &OnionSkin {
        &self.onion_skin
    }

    /// Replace onion skin settings.
    pub fn set_onion_skin(&mut self, onion_skin: OnionSkin) {
        self.onion_skin = onion_skin;
    }

    /// Neighbour frames to ghost around the current frame, nearest first on
    /// each side. Empty when onion skinning is off.
    pub fn onion_skin_frames(&self) -> Vec<OnionFrame> {
        let o = &self.onion_skin;
        if !o.enabled {
            return Vec::new();
        }
        let current = i64::from(self.current_frame);
        let fade = |distance: u32, span: u32| o.opacity * (span - distance + 1) as f32 / span as f32;
        let before = (1..=o.frames_before).map(|d| (-i64::from(d), fade(d, o.frames_before)));
        let after = (1..=o.frames_after).map(|d| (i64::from(d), fade(d, o.frames_after)));
        before
            .chain(after)
            .filter_map(|(offset, opacity)| {
                let frame = current + offset;
                (0..i64::from(self.frame_count))
                    .contains(&frame)
                    .then_some(OnionFrame {
                        frame: frame as u32,
                        offset,
                        opacity,
                    })
            })
            .collect()
    }

    // ---- playback ----

    /// Transport state.
    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    /// Current travel direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Start playing, or pause when already playing.
    pub fn toggle_play_pause(&mut self) {
        match self.playback {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Stopped | PlaybackState::Paused => self.play(),
        }
    }

    /// Start or resume playback.
    pub fn play(&mut self) {
        self.set_playback(PlaybackState::Playing);
    }

    /// Hold the current frame.
    pub fn pause(&mut self) {
        if self.playback == PlaybackState::Playing {
            self.set_playback(PlaybackState::Paused);
        }
    }

    /// Stop and rewind to frame 0.
    pub fn stop(&mut self) {
        self.batch(|s| {
            s.set_playback(PlaybackState::Stopped);
            s.direction = Direction::Forward;
            s.move_to(0);
        });
    }

    fn set_playback(&mut self, state: PlaybackState) {
        if state == self.playback {
            return;
        }
        tracing::debug!(from = ?self.playback, to = ?state, frame = self.current_frame, "playback");
        self.playback = state;
        self.clock.reset();
        self.emit(AnimationEvent::PlaybackStateChanged(state));
    }

    /// Advance one frame if playing. Returns `false` when not playing.
    pub fn tick(&mut self) -> bool {
        if self.playback != PlaybackState::Playing {
            return false;
        }
        let mode = LoopMode {
            looping: self.looping,
            ping_pong: self.ping_pong,
        };
        let next = step(self.current_frame, self.frame_count, self.direction, mode);
        self.direction = next.direction;
        self.move_to(next.frame);
        if next.stop {
            self.set_playback(PlaybackState::Stopped);
        }
        true
    }

    /// Feed elapsed wall time; runs the due ticks one after another.
    ///
    /// Returns the number of ticks run. Ticking ends early when playback
    /// stops, and pending time is dropped on pause or stop.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.playback != PlaybackState::Playing {
            return 0;
        }
        let due = self.clock.advance(elapsed, self.fps);
        self.batch(|s| {
            let mut ran = 0;
            while ran < due && s.tick() {
                ran += 1;
            }
            ran
        })
    }

    // ---- layer tracks ----

    /// Layer tracks in document order (bottom to top).
    pub fn layer_tracks(&self) -> &[LayerTrack] {
        &self.layer_tracks
    }

    /// Track of a document layer.
    pub fn layer_track(&self, layer: LayerId) -> Option<&LayerTrack> {
        self.layer_tracks.iter().find(|t| t.layer_id == layer)
    }

    /// Reconcile layer tracks with the document's layers.
    ///
    /// New layers get empty tracks, tracks of removed layers are dropped and
    /// renamed layers only update the display name. Returns `true` (and fires
    /// `TracksChanged`) when anything changed.
    #[tracing::instrument(skip(self, doc))]
    pub fn sync_tracks_from_document(&mut self, doc: &dyn LayerDocument) -> bool {
        let layers = doc.flattened_layers();
        let before: Vec<LayerId> = self.layer_tracks.iter().map(|t| t.layer_id).collect();
        let mut old = std::mem::take(&mut self.layer_tracks);
        let mut changed = false;
        let mut synced = Vec::with_capacity(layers.len());
        for info in layers {
            match old.iter().position(|t| t.layer_id == info.id) {
                Some(pos) => {
                    let mut track = old.remove(pos);
                    if track.name != info.name {
                        track.name = info.name;
                        changed = true;
                    }
                    synced.push(track);
                }
                None => synced.push(LayerTrack::new(info.id, info.name)),
            }
        }
        if !old.is_empty() {
            tracing::debug!(dropped = old.len(), "discarding tracks of removed layers");
        }
        changed |= synced.iter().map(|t| t.layer_id).ne(before.iter().copied());
        self.layer_tracks = synced;
        if changed {
            self.emit(AnimationEvent::TracksChanged);
        }
        changed
    }

    fn layer_track_mut(&mut self, layer: LayerId) -> PixreelResult<&mut LayerTrack> {
        self.layer_tracks
            .iter_mut()
            .find(|t| t.layer_id == layer)
            .ok_or_else(|| PixreelError::validation(format!("no track for {layer}")))
    }

    fn check_frame(&self, frame: u32) -> PixreelResult<()> {
        if frame >= self.frame_count {
            return Err(PixreelError::keyframe(format!(
                "frame {frame} is outside [0, {})",
                self.frame_count
            )));
        }
        Ok(())
    }

    /// Insert or replace a layer keyframe.
    pub fn set_layer_keyframe(
        &mut self,
        layer: LayerId,
        frame: u32,
        snapshot: LayerSnapshot,
    ) -> PixreelResult<()> {
        self.check_frame(frame)?;
        self.layer_track_mut(layer)?
            .keyframes
            .set_keyframe(frame, snapshot);
        self.emit(AnimationEvent::KeyframeChanged {
            track: TrackRef::Layer(layer),
            frame,
        });
        Ok(())
    }

    /// Remove a layer keyframe, returning it.
    pub fn remove_layer_keyframe(
        &mut self,
        layer: LayerId,
        frame: u32,
    ) -> PixreelResult<Option<LayerSnapshot>> {
        let removed = self.layer_track_mut(layer)?.keyframes.remove_keyframe_at(frame);
        if removed.is_some() {
            self.emit(AnimationEvent::KeyframeChanged {
                track: TrackRef::Layer(layer),
                frame,
            });
        }
        Ok(removed)
    }

    /// Move a layer keyframe. `Ok(false)` when `from` holds no keyframe.
    pub fn move_layer_keyframe(&mut self, layer: LayerId, from: u32, to: u32) -> PixreelResult<bool> {
        let frame_count = self.frame_count;
        let moved = self
            .layer_track_mut(layer)?
            .keyframes
            .move_keyframe(from, to, frame_count)?;
        if moved && from != to {
            self.batch(|s| {
                for frame in [from, to] {
                    s.emit(AnimationEvent::KeyframeChanged {
                        track: TrackRef::Layer(layer),
                        frame,
                    });
                }
            });
        }
        Ok(moved)
    }

    /// Record an edit of a layer's state at the current frame.
    ///
    /// With auto-keyframe on, a keyframe is written at the current frame.
    /// Otherwise an existing keyframe at the current frame is updated and any
    /// other edit is left to the document. Returns `true` when a keyframe was
    /// written.
    pub fn record_layer_edit(&mut self, layer: LayerId, snapshot: LayerSnapshot) -> PixreelResult<bool> {
        let frame = self.current_frame;
        let has_key = self.layer_track_mut(layer)?.keyframes.has_keyframe_at(frame);
        if !self.auto_keyframe && !has_key {
            return Ok(false);
        }
        self.set_layer_keyframe(layer, frame, snapshot)?;
        Ok(true)
    }

    /// Layer state in effect at `frame`; `None` means the static layer state.
    pub fn resolved_layer_state(&self, layer: LayerId, frame: u32) -> Option<&LayerSnapshot> {
        self.layer_track(layer)?.resolve(frame)
    }

    // ---- stage ----

    /// Static stage configuration.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Replace the stage configuration after validating it.
    pub fn set_stage(&mut self, stage: Stage) -> PixreelResult<()> {
        stage.validate()?;
        if stage != self.stage {
            self.stage = stage;
            self.emit(AnimationEvent::StageSettingsChanged);
        }
        Ok(())
    }

    /// Camera keyframes.
    pub fn stage_track(&self) -> &StageTrack {
        &self.stage_track
    }

    /// Insert or replace a stage keyframe.
    pub fn set_stage_keyframe(&mut self, frame: u32, snapshot: StageSnapshot) -> PixreelResult<()> {
        self.check_frame(frame)?;
        self.stage_track.keyframes.set_keyframe(frame, snapshot);
        self.emit(AnimationEvent::KeyframeChanged {
            track: TrackRef::Stage,
            frame,
        });
        Ok(())
    }

    /// Remove a stage keyframe, returning it.
    pub fn remove_stage_keyframe(&mut self, frame: u32) -> Option<StageSnapshot> {
        let removed = self.stage_track.keyframes.remove_keyframe_at(frame);
        if removed.is_some() {
            self.emit(AnimationEvent::KeyframeChanged {
                track: TrackRef::Stage,
                frame,
            });
        }
        removed
    }

    /// Move a stage keyframe. `Ok(false)` when `from` holds no keyframe.
    pub fn move_stage_keyframe(&mut self, from: u32, to: u32) -> PixreelResult<bool> {
        let moved = self
            .stage_track
            .keyframes
            .move_keyframe(from, to, self.frame_count)?;
        if moved && from != to {
            self.batch(|s| {
                for frame in [from, to] {
                    s.emit(AnimationEvent::KeyframeChanged {
                        track: TrackRef::Stage,
                        frame,
                    });
                }
            });
        }
        Ok(moved)
    }

    /// Camera state at `frame`; `None` when the stage track is empty.
    pub fn resolved_stage(&self, frame: u32) -> Option<StageSnapshot> {
        self.stage_track.resolve(frame)
    }

    /// Source rectangle captured at `frame`.
    pub fn capture_rect(&self, frame: u32) -> CaptureRect {
        self.stage.capture_rect(self.resolved_stage(frame).as_ref())
    }

    /// Keyframes stored past the current frame count, per track.
    pub fn orphaned_keyframes(&self) -> Vec<(TrackRef, u32)> {
        let n = self.frame_count;
        let layers = self.layer_tracks.iter().flat_map(|t| {
            t.keyframes
                .orphaned_indices(n)
                .into_iter()
                .map(move |f| (TrackRef::Layer(t.layer_id), f))
        });
        let stage = self
            .stage_track
            .keyframes
            .orphaned_indices(n)
            .into_iter()
            .map(|f| (TrackRef::Stage, f));
        layers.chain(stage).collect()
    }

    // ---- sub-routines ----

    /// Sub-routines in insertion order.
    pub fn sub_routines(&self) -> &SubRoutineCollection {
        &self.sub_routines
    }

    /// Add a sub-routine; embedded reels load immediately.
    pub fn add_sub_routine(&mut self, mut sub: SubRoutine) -> SubRoutineId {
        if sub.has_embedded_pixels() {
            sub.load_reel(&EmbeddedReelResolver);
        }
        let id = self.sub_routines.add(sub);
        self.emit(AnimationEvent::SubRoutinesChanged);
        id
    }

    /// Add a sub-routine and resolve its reel through `resolver`.
    ///
    /// The sub-routine is added even when resolution fails; it then stays
    /// unloaded and the warning is returned.
    pub fn add_sub_routine_with(
        &mut self,
        mut sub: SubRoutine,
        resolver: &dyn ReelResolver,
    ) -> (SubRoutineId, Option<ReelLoadWarning>) {
        let warning = sub.load_reel(resolver);
        let id = self.sub_routines.add(sub);
        self.emit(AnimationEvent::SubRoutinesChanged);
        (id, warning)
    }

    /// Resolve every unloaded reel.
    pub fn load_sub_routines(&mut self, resolver: &dyn ReelResolver) -> Vec<ReelLoadWarning> {
        let mut warnings = Vec::new();
        let mut loaded_any = false;
        for sub in self.sub_routines.iter_mut().filter(|s| !s.is_loaded()) {
            match sub.load_reel(resolver) {
                Some(w) => warnings.push(w),
                None => loaded_any = true,
            }
        }
        if loaded_any {
            self.emit(AnimationEvent::SubRoutinesChanged);
        }
        warnings
    }

    /// Remove a sub-routine.
    pub fn remove_sub_routine(&mut self, id: SubRoutineId) -> Option<SubRoutine> {
        let removed = self.sub_routines.remove(id);
        if removed.is_some() {
            self.emit(AnimationEvent::SubRoutinesChanged);
        }
        removed
    }

    /// Edit a sub-routine in place (timing drags, channels, Z-order...).
    pub fn update_sub_routine<R>(
        &mut self,
        id: SubRoutineId,
        edit: impl FnOnce(&mut SubRoutine) -> R,
    ) -> PixreelResult<R> {
        let sub = self
            .sub_routines
            .get_mut(id)
            .ok_or_else(|| PixreelError::validation(format!("unknown sub-routine {}", id.0)))?;
        let out = edit(sub);
        self.emit(AnimationEvent::SubRoutinesChanged);
        Ok(out)
    }

    /// Unified stacking list of layers and sub-routines, top first.
    pub fn stacking_order(&self, doc: &dyn LayerDocument) -> Vec<ZEntry> {
        zorder::stacking_order(&doc.flattened_layers(), &self.sub_routines)
    }

    // ---- audio ----

    /// Audio tracks and their decode state.
    pub fn audio_tracks(&self) -> &AudioTrackCollection {
        &self.audio
    }

    /// Add an audio track.
    pub fn add_audio_track(&mut self, track: AudioTrack) -> AudioTrackId {
        let id = self.audio.add(track);
        self.emit(AnimationEvent::AudioTracksChanged);
        id
    }

    /// Remove an audio track; a pending decode result is discarded.
    pub fn remove_audio_track(&mut self, id: AudioTrackId) -> Option<AudioTrack> {
        let removed = self.audio.remove(id);
        if removed.is_some() {
            self.emit(AnimationEvent::AudioTracksChanged);
        }
        removed
    }

    /// Point an audio track at a different file.
    ///
    /// The track becomes unloaded and results of a decode still running for
    /// the old file are discarded.
    pub fn replace_audio_source(
        &mut self,
        id: AudioTrackId,
        path: impl Into<PathBuf>,
    ) -> PixreelResult<()> {
        self.audio.replace_source(id, path)?;
        self.emit(AnimationEvent::AudioTracksChanged);
        Ok(())
    }

    /// Edit an audio track's settings in place.
    pub fn update_audio_track<R>(
        &mut self,
        id: AudioTrackId,
        edit: impl FnOnce(&mut AudioTrack) -> R,
    ) -> PixreelResult<R> {
        let track = self
            .audio
            .get_mut(id)
            .ok_or_else(|| PixreelError::validation(format!("unknown audio track {}", id.0)))?;
        let out = edit(track);
        self.emit(AnimationEvent::AudioTracksChanged);
        Ok(out)
    }

    /// Fold or unfold the audio rows.
    pub fn set_audio_collapsed(&mut self, collapsed: bool) {
        if collapsed != self.audio.is_collapsed() {
            self.audio.set_collapsed(collapsed);
            self.emit(AnimationEvent::AudioTracksChanged);
        }
    }

    /// Start background waveform decodes for unloaded tracks.
    pub fn start_audio_decode(&mut self, root: &Path) -> PixreelResult<()> {
        self.audio.start_decode_all(root)
    }

    /// Apply finished decodes without blocking.
    pub fn poll_audio(&mut self) -> Vec<WaveformEvent> {
        let events = self.audio.poll();
        self.publish_waveforms(&events);
        events
    }

    /// Block until decodes finish or `timeout` passes, then apply them.
    pub fn wait_audio(&mut self, timeout: Duration) -> Vec<WaveformEvent> {
        let events = self.audio.wait(timeout);
        self.publish_waveforms(&events);
        events
    }

    fn publish_waveforms(&mut self, events: &[WaveformEvent]) {
        self.batch(|s| {
            for event in events {
                if let WaveformEvent::Loaded(id) = event {
                    s.emit(AnimationEvent::WaveformUpdated(*id));
                    s.emit(AnimationEvent::AudioTracksChanged);
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/animation.rs"]
mod tests;

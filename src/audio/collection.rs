use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};

use crate::{
    audio::track::{AudioTrack, AudioTrackId},
    audio::waveform::{DEFAULT_POINTS_PER_SECOND, WaveformJob, WaveformMessage, WaveformUpdate},
    foundation::error::{PixreelError, PixreelResult},
};

/// Outcome of applying one background decode message.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveformEvent {
    /// Progress of a running decode.
    Progress(AudioTrackId, f32),
    /// Waveform applied; the track is now loaded.
    Loaded(AudioTrackId),
    /// Decode failed; the track stays unloaded.
    Failed(AudioTrackId, String),
}

/// Audio tracks in insertion order, plus their background decodes.
#[derive(Debug)]
pub struct AudioTrackCollection {
    tracks: Vec<AudioTrack>,
    next_id: u64,
    collapsed: bool,
    points_per_second: u32,
    jobs: HashMap<AudioTrackId, WaveformJob>,
    tx: Sender<WaveformMessage>,
    rx: Receiver<WaveformMessage>,
}

impl Default for AudioTrackCollection {
    fn default() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tracks: Vec::new(),
            next_id: 0,
            collapsed: false,
            points_per_second: DEFAULT_POINTS_PER_SECOND,
            jobs: HashMap::new(),
            tx,
            rx,
        }
    }
}

impl AudioTrackCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track, assigning a fresh id.
    pub fn add(&mut self, mut track: AudioTrack) -> AudioTrackId {
        self.next_id = self
            .next_id
            .max(self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0))
            + 1;
        track.id = AudioTrackId(self.next_id);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Restore a deserialized track, keeping its id when unused.
    pub(crate) fn restore(&mut self, track: AudioTrack) -> AudioTrackId {
        if track.id.0 == 0 || self.get(track.id).is_some() {
            return self.add(track);
        }
        self.next_id = self.next_id.max(track.id.0);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Remove a track; a running decode for it is cancelled.
    pub fn remove(&mut self, id: AudioTrackId) -> Option<AudioTrack> {
        self.cancel_job(id);
        let idx = self.tracks.iter().position(|t| t.id == id)?;
        Some(self.tracks.remove(idx))
    }

    /// Point a track at a different file; earlier decode results are dropped.
    pub fn replace_source(&mut self, id: AudioTrackId, path: impl Into<PathBuf>) -> PixreelResult<()> {
        self.cancel_job(id);
        self.require_mut(id)?.retarget(path.into());
        Ok(())
    }

    /// Track by id.
    pub fn get(&self, id: AudioTrackId) -> Option<&AudioTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Mutable track by id.
    pub fn get_mut(&mut self, id: AudioTrackId) -> Option<&mut AudioTrack> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    /// Tracks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &AudioTrack> {
        self.tracks.iter()
    }

    /// Number of tracks.
    pub fn count(&self) -> usize {
        self.tracks.len()
    }

    /// Number of tracks with a waveform.
    pub fn loaded_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_loaded()).count()
    }

    /// `true` when at least one track is loaded.
    pub fn has_loaded_tracks(&self) -> bool {
        self.tracks.iter().any(|t| t.is_loaded())
    }

    /// Whether the audio rows are folded into one.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Fold or unfold the audio rows.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// Timeline rows taken by audio: one when collapsed, else one per track.
    pub fn row_count(&self) -> usize {
        if self.collapsed {
            usize::from(!self.tracks.is_empty())
        } else {
            self.tracks.len()
        }
    }

    /// Waveform resolution used for new decodes.
    pub fn set_points_per_second(&mut self, points: u32) -> PixreelResult<()> {
        if points == 0 {
            return Err(PixreelError::validation(
                "waveform resolution must be at least one point per second",
            ));
        }
        self.points_per_second = points;
        Ok(())
    }

    /// Start decoding a track's waveform in the background.
    ///
    /// Relative paths resolve against `root`. A decode already running for
    /// the track is cancelled and its results will be discarded.
    #[tracing::instrument(skip(self, root))]
    pub fn start_decode(&mut self, id: AudioTrackId, root: &Path) -> PixreelResult<()> {
        self.cancel_job(id);
        let points = self.points_per_second;
        let tx = self.tx.clone();
        let track = self.require_mut(id)?;
        track.generation += 1;
        track.set_progress(0.0);
        let path = if track.path().is_absolute() {
            track.path().to_path_buf()
        } else {
            root.join(track.path())
        };
        let job = WaveformJob::spawn(id, track.generation, path, points, tx)?;
        self.jobs.insert(id, job);
        Ok(())
    }

    /// Start decodes for every unloaded track.
    pub fn start_decode_all(&mut self, root: &Path) -> PixreelResult<()> {
        let pending: Vec<AudioTrackId> = self
            .tracks
            .iter()
            .filter(|t| !t.is_loaded())
            .map(|t| t.id)
            .collect();
        for id in pending {
            self.start_decode(id, root)?;
        }
        Ok(())
    }

    /// `true` while any decode has not reported completion.
    pub fn is_decoding(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Apply every message received so far without blocking.
    pub fn poll(&mut self) -> Vec<WaveformEvent> {
        let messages: Vec<WaveformMessage> = self.rx.try_iter().collect();
        messages
            .into_iter()
            .filter_map(|m| self.apply(m))
            .collect()
    }

    /// Block until all decodes finished or `timeout` elapsed.
    pub fn wait(&mut self, timeout: Duration) -> Vec<WaveformEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.is_decoding() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok(msg) => events.extend(self.apply(msg)),
                Err(_) => break,
            }
        }
        events
    }

    fn apply(&mut self, msg: WaveformMessage) -> Option<WaveformEvent> {
        let Some(track) = self.tracks.iter_mut().find(|t| t.id == msg.track) else {
            tracing::debug!(track = msg.track.0, "dropping waveform result for removed track");
            return None;
        };
        if track.generation != msg.generation {
            tracing::debug!(
                track = msg.track.0,
                stale = msg.generation,
                current = track.generation,
                "dropping stale waveform result"
            );
            return None;
        }
        match msg.update {
            WaveformUpdate::Progress(p) => {
                track.set_progress(p);
                Some(WaveformEvent::Progress(msg.track, p))
            }
            WaveformUpdate::Done(Ok(summary)) => {
                track.apply_waveform(summary);
                self.jobs.remove(&msg.track);
                Some(WaveformEvent::Loaded(msg.track))
            }
            WaveformUpdate::Done(Err(reason)) => {
                tracing::warn!(track = msg.track.0, %reason, "waveform decode failed");
                track.unload();
                self.jobs.remove(&msg.track);
                Some(WaveformEvent::Failed(msg.track, reason))
            }
        }
    }

    fn cancel_job(&mut self, id: AudioTrackId) {
        if let Some(job) = self.jobs.remove(&id) {
            job.cancel();
        }
    }

    fn require_mut(&mut self, id: AudioTrackId) -> PixreelResult<&mut AudioTrack> {
        self.get_mut(id)
            .ok_or_else(|| PixreelError::validation(format!("unknown audio track {}", id.0)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/collection.rs"]
mod tests;

use std::path::{Path, PathBuf};

use crate::{
    foundation::core::FrameRange,
    foundation::error::{PixreelError, PixreelResult},
};

/// Stable identifier of an audio track.
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
pub struct AudioTrackId(pub u64);

/// One bucket of the waveform summary.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaveformPoint {
    /// Bucket start in milliseconds.
    pub time_ms: f64,
    /// Mean of the left and right peaks.
    pub average_peak: f32,
    /// Absolute peak of the left (or mono) channel, `[0, 1]`.
    pub left_peak: f32,
    /// Absolute peak of the right channel (equals left for mono).
    pub right_peak: f32,
}

/// User-facing playback settings of a track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Muted tracks keep their waveform but play silently.
    pub muted: bool,
    /// Gain in `[0, 1]`.
    pub volume: f32,
    /// Timeline frame where the audio starts; may be negative.
    pub start_frame_offset: i64,
    /// Label shown in the track header.
    pub display_name: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 1.0,
            start_frame_offset: 0,
            display_name: String::new(),
        }
    }
}

/// Decoded waveform summary of one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveformSummary {
    /// Total duration in milliseconds.
    pub duration_ms: f64,
    /// Peak buckets in time order.
    pub points: Vec<WaveformPoint>,
}

/// An audio file aligned to the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioTrack {
    /// Stable id, assigned by the owning collection.
    #[serde(default)]
    pub id: AudioTrackId,
    path: PathBuf,
    /// Playback settings.
    #[serde(default)]
    pub settings: AudioSettings,
    /// Last known duration; refreshed on decode.
    #[serde(default)]
    duration_ms: f64,
    #[serde(skip)]
    loaded: bool,
    #[serde(skip)]
    waveform: Vec<WaveformPoint>,
    #[serde(skip)]
    progress: f32,
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl AudioTrack {
    /// Unloaded track for `path`.
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            id: AudioTrackId::default(),
            path: path.into(),
            settings: AudioSettings {
                display_name: display_name.into(),
                ..AudioSettings::default()
            },
            duration_ms: 0.0,
            loaded: false,
            waveform: Vec::new(),
            progress: 0.0,
            generation: 0,
        }
    }

    /// Source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` once a waveform has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Duration in milliseconds (zero until known).
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Waveform buckets; empty until loaded.
    pub fn waveform(&self) -> &[WaveformPoint] {
        &self.waveform
    }

    /// Decode progress in `[0, 1]`.
    pub fn waveform_progress(&self) -> f32 {
        self.progress
    }

    /// Set the gain; values outside `[0, 1]` are rejected.
    pub fn set_volume(&mut self, volume: f32) -> PixreelResult<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PixreelError::validation(format!(
                "volume must be in [0, 1], got {volume}"
            )));
        }
        self.settings.volume = volume;
        Ok(())
    }

    /// Move the track by `delta` frames. Pure integer shift.
    pub fn shift_offset(&mut self, delta: i64) {
        self.settings.start_frame_offset = self.settings.start_frame_offset.saturating_add(delta);
    }

    /// Timeline frame for a time inside the file.
    pub fn frame_for_time(&self, time_ms: f64, fps: u32) -> i64 {
        frames_for_ms(time_ms, fps) + self.settings.start_frame_offset
    }

    /// Number of timeline frames the audio spans (rounded up).
    pub fn duration_frames(&self, fps: u32) -> i64 {
        (self.duration_ms * f64::from(fps) / 1000.0).ceil() as i64
    }

    /// Unclipped span `[offset, offset + duration_frames)`.
    pub fn frame_span(&self, fps: u32) -> (i64, i64) {
        let start = self.settings.start_frame_offset;
        (start, start.saturating_add(self.duration_frames(fps)))
    }

    /// Span clipped to `[0, frame_count)` for display; `None` when off-screen.
    pub fn display_frames(&self, fps: u32, frame_count: u32) -> Option<FrameRange> {
        let (start, end) = self.frame_span(fps);
        FrameRange::clip_signed(start, end, frame_count)
    }

    pub(crate) fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub(crate) fn apply_waveform(&mut self, summary: WaveformSummary) {
        self.duration_ms = summary.duration_ms;
        self.waveform = summary.points;
        self.loaded = true;
        self.progress = 1.0;
    }

    // Decode results issued for the previous file no longer match.
    pub(crate) fn retarget(&mut self, path: PathBuf) {
        self.generation += 1;
        self.path = path;
        self.unload();
    }

    pub(crate) fn unload(&mut self) {
        self.loaded = false;
        self.waveform.clear();
        self.progress = 0.0;
    }
}

fn frames_for_ms(time_ms: f64, fps: u32) -> i64 {
    (time_ms * f64::from(fps) / 1000.0).floor() as i64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;

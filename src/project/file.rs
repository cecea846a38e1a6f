use std::path::Path;

use anyhow::Context;

use crate::{
    assets::reel::EmbeddedReelResolver,
    audio::track::AudioTrack,
    document::model::RasterDocument,
    foundation::error::{PixreelError, PixreelResult},
    state::animation::{CanvasAnimationState, OnionSkin},
    timeline::layer_track::LayerTrack,
    timeline::stage::{Stage, StageTrack},
    timeline::subroutine::SubRoutine,
};

/// Current persistence format.
pub const FORMAT_VERSION: u32 = 2;

/// Serialized form of a [`CanvasAnimationState`].
///
/// Runtime state (playback, listeners, decoded waveforms, resolved reels) is
/// not part of the file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationProject {
    /// Format the file was written with.
    pub format_version: u32,
    /// Number of frames.
    pub frame_count: u32,
    /// Frames per second.
    pub fps: u32,
    /// Frame selected when saved.
    #[serde(default)]
    pub current_frame: u32,
    /// Wrap at the end.
    #[serde(default)]
    pub looping: bool,
    /// Bounce at the ends.
    #[serde(default)]
    pub ping_pong: bool,
    /// Auto-keyframe layer edits.
    #[serde(default)]
    pub auto_keyframe: bool,
    /// Onion skin settings.
    #[serde(default)]
    pub onion_skin: OnionSkin,
    /// Layer tracks, document order.
    #[serde(default)]
    pub layer_tracks: Vec<LayerTrack>,
    /// Stage configuration.
    pub stage: Stage,
    /// Stage keyframes.
    #[serde(default)]
    pub stage_track: StageTrack,
    /// Sub-routines, insertion order.
    #[serde(default)]
    pub sub_routines: Vec<SubRoutine>,
    /// Audio tracks, insertion order.
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    /// Audio rows folded.
    #[serde(default)]
    pub audio_collapsed: bool,
}

impl AnimationProject {
    /// Capture the persistent part of `state`.
    pub fn from_state(state: &CanvasAnimationState) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            frame_count: state.frame_count,
            fps: state.fps,
            current_frame: state.current_frame,
            looping: state.looping,
            ping_pong: state.ping_pong,
            auto_keyframe: state.auto_keyframe,
            onion_skin: state.onion_skin.clone(),
            layer_tracks: state.layer_tracks.clone(),
            stage: state.stage.clone(),
            stage_track: state.stage_track.clone(),
            sub_routines: state.sub_routines.iter().cloned().collect(),
            audio_tracks: state.audio.iter().cloned().collect(),
            audio_collapsed: state.audio.is_collapsed(),
        }
    }

    /// Rebuild a live animation. Embedded reels are resolved; external reels
    /// stay unloaded until resolved by the caller.
    pub fn into_state(self) -> PixreelResult<CanvasAnimationState> {
        self.validate()?;
        let mut state = CanvasAnimationState::new(self.stage.output());
        state.frame_count = self.frame_count;
        state.fps = self.fps;
        state.current_frame = self.current_frame.min(self.frame_count - 1);
        state.looping = self.looping;
        state.ping_pong = self.ping_pong;
        state.auto_keyframe = self.auto_keyframe;
        state.onion_skin = self.onion_skin;
        state.layer_tracks = self.layer_tracks;
        state.stage = self.stage;
        state.stage_track = self.stage_track;
        for sub in self.sub_routines {
            let id = state.sub_routines.restore(sub);
            if let Some(s) = state.sub_routines.get_mut(id).filter(|s| s.has_embedded_pixels()) {
                s.load_reel(&EmbeddedReelResolver);
            }
        }
        for track in self.audio_tracks {
            state.audio.restore(track);
        }
        state.audio.set_collapsed(self.audio_collapsed);
        Ok(state)
    }

    /// Reject files this build cannot represent.
    pub fn validate(&self) -> PixreelResult<()> {
        if self.format_version == 0 || self.format_version > FORMAT_VERSION {
            return Err(PixreelError::serde(format!(
                "unsupported animation format version {} (this build reads up to {FORMAT_VERSION})",
                self.format_version
            )));
        }
        if self.frame_count == 0 {
            return Err(PixreelError::validation("frame count must be at least 1"));
        }
        if self.fps == 0 {
            return Err(PixreelError::validation("frame rate must be at least 1"));
        }
        self.stage.validate()?;
        if let Some(sub) = self.sub_routines.iter().find(|s| s.duration_frames() == 0) {
            return Err(PixreelError::validation(format!(
                "sub-routine '{}' has zero duration",
                sub.name
            )));
        }
        Ok(())
    }

    /// Parse from JSON.
    pub fn from_json_str(s: &str) -> PixreelResult<Self> {
        let project: Self = serde_json::from_str(s)?;
        project.validate()?;
        Ok(project)
    }

    /// Pretty JSON.
    pub fn to_json_string(&self) -> PixreelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a JSON file.
    #[tracing::instrument]
    pub fn load(path: &Path) -> PixreelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read animation from '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Write as pretty JSON.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, path: &Path) -> PixreelResult<()> {
        let text = self.to_json_string()?;
        std::fs::write(path, text)
            .with_context(|| format!("write animation to '{}'", path.display()))?;
        Ok(())
    }
}

/// A document together with its animation, as consumed by the CLI.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectBundle {
    /// Layered raster document.
    pub document: RasterDocument,
    /// Animation of the document.
    pub animation: AnimationProject,
}

impl ProjectBundle {
    /// Bundle the current state of a document and its animation.
    pub fn new(document: RasterDocument, state: &CanvasAnimationState) -> Self {
        Self {
            document,
            animation: AnimationProject::from_state(state),
        }
    }

    /// Read and validate a bundle file.
    #[tracing::instrument]
    pub fn load(path: &Path) -> PixreelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read project from '{}'", path.display()))?;
        let bundle: Self = serde_json::from_str(&text)?;
        bundle.document.validate()?;
        bundle.animation.validate()?;
        Ok(bundle)
    }

    /// Write as pretty JSON.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, path: &Path) -> PixreelResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("write project to '{}'", path.display()))?;
        Ok(())
    }

    /// Live state with layer tracks reconciled against the document.
    pub fn open(self) -> PixreelResult<(RasterDocument, CanvasAnimationState)> {
        let mut state = self.animation.into_state()?;
        state.sync_tracks_from_document(&self.document);
        Ok((self.document, state))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/file.rs"]
mod tests;

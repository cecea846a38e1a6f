use std::{
    io::Cursor,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use anyhow::Context;
use crossbeam_channel::Sender;
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

use crate::{
    audio::track::{AudioTrackId, WaveformPoint, WaveformSummary},
    foundation::error::{PixreelError, PixreelResult},
};

/// Default waveform resolution.
pub const DEFAULT_POINTS_PER_SECOND: u32 = 100;

const PROGRESS_STEP: f32 = 0.05;

/// Decode `bytes` and reduce them to a peak summary.
pub fn summarize_bytes(bytes: &[u8], points_per_second: u32) -> PixreelResult<WaveformSummary> {
    let cancel = AtomicBool::new(false);
    decode_waveform(bytes, points_per_second, &cancel, &mut |_| {})?
        .ok_or_else(|| PixreelError::resource("waveform decode was cancelled"))
}

/// Streaming decode with progress reporting.
///
/// Returns `Ok(None)` when `cancel` is raised before the end of the stream.
/// Progress is reported in `[0, 1]` when the stream length is known.
#[tracing::instrument(skip(bytes, cancel, on_progress), fields(len = bytes.len()))]
pub fn decode_waveform(
    bytes: &[u8],
    points_per_second: u32,
    cancel: &AtomicBool,
    on_progress: &mut dyn FnMut(f32),
) -> PixreelResult<Option<WaveformSummary>> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("unsupported audio format")?;
    let mut format = probed.format;

    let track = format.default_track().context("no audio track found")?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .context("unsupported audio codec")?;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| PixreelError::resource("audio stream has no sample rate"))?;
    let total_frames = params.n_frames;
    let mut peaks = PeakAccumulator::new(sample_rate, points_per_second);
    let mut reported = 0.0f32;

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(anyhow::Error::new(e).context("read audio packet").into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                tracing::debug!(msg, "skipping undecodable audio packet");
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context("decode audio packet").into()),
        };

        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        peaks.push_interleaved(buf.samples(), spec.channels.count());

        if let Some(total) = total_frames.filter(|t| *t > 0) {
            let fraction = (peaks.frames as f64 / total as f64).min(1.0) as f32;
            if fraction - reported >= PROGRESS_STEP {
                reported = fraction;
                on_progress(fraction);
            }
        }
    }

    Ok(Some(peaks.finish()))
}

struct PeakAccumulator {
    sample_rate: u32,
    frames_per_point: u64,
    frames: u64,
    in_bucket: u64,
    left: f32,
    right: f32,
    points: Vec<WaveformPoint>,
}

impl PeakAccumulator {
    fn new(sample_rate: u32, points_per_second: u32) -> Self {
        let frames_per_point = (u64::from(sample_rate) / u64::from(points_per_second.max(1))).max(1);
        Self {
            sample_rate,
            frames_per_point,
            frames: 0,
            in_bucket: 0,
            left: 0.0,
            right: 0.0,
            points: Vec::new(),
        }
    }

    fn push_interleaved(&mut self, samples: &[f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in samples.chunks_exact(channels) {
            let l = frame[0].abs().min(1.0);
            let r = frame.get(1).map_or(l, |s| s.abs().min(1.0));
            self.left = self.left.max(l);
            self.right = self.right.max(r);
            self.frames += 1;
            self.in_bucket += 1;
            if self.in_bucket == self.frames_per_point {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        let start_frame = self.frames - self.in_bucket;
        self.points.push(WaveformPoint {
            time_ms: start_frame as f64 * 1000.0 / f64::from(self.sample_rate),
            average_peak: (self.left + self.right) / 2.0,
            left_peak: self.left,
            right_peak: self.right,
        });
        self.in_bucket = 0;
        self.left = 0.0;
        self.right = 0.0;
    }

    fn finish(mut self) -> WaveformSummary {
        if self.in_bucket > 0 {
            self.flush();
        }
        WaveformSummary {
            duration_ms: self.frames as f64 * 1000.0 / f64::from(self.sample_rate),
            points: self.points,
        }
    }
}

/// Update published by a background decode.
#[derive(Clone, Debug, PartialEq)]
pub enum WaveformUpdate {
    /// Fraction decoded so far.
    Progress(f32),
    /// Final result; sent exactly once unless the job was cancelled.
    Done(Result<WaveformSummary, String>),
}

/// Message from a decode thread, tagged with the request it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformMessage {
    /// Track the decode was started for.
    pub track: AudioTrackId,
    /// Request generation; stale generations are discarded by the receiver.
    pub generation: u64,
    /// Payload.
    pub update: WaveformUpdate,
}

/// Handle to a waveform decode running on its own thread.
#[derive(Debug)]
pub struct WaveformJob {
    cancel: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

impl WaveformJob {
    /// Read and decode `path` off-thread, reporting through `tx`.
    pub fn spawn(
        track: AudioTrackId,
        generation: u64,
        path: PathBuf,
        points_per_second: u32,
        tx: Sender<WaveformMessage>,
    ) -> PixreelResult<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let handle = thread::Builder::new()
            .name(format!("pixreel-waveform-{}", track.0))
            .spawn(move || {
                let send = |update: WaveformUpdate| {
                    // Receiver gone means the collection was dropped.
                    let _ = tx.send(WaveformMessage {
                        track,
                        generation,
                        update,
                    });
                };
                let result = std::fs::read(&path)
                    .with_context(|| format!("read audio from '{}'", path.display()))
                    .map_err(PixreelError::from)
                    .and_then(|bytes| {
                        decode_waveform(&bytes, points_per_second, &flag, &mut |p| {
                            send(WaveformUpdate::Progress(p))
                        })
                    });
                match result {
                    Ok(Some(summary)) => send(WaveformUpdate::Done(Ok(summary))),
                    Ok(None) => tracing::debug!(track = track.0, "waveform decode cancelled"),
                    Err(e) => send(WaveformUpdate::Done(Err(e.to_string()))),
                }
            })
            .context("spawn waveform thread")?;
        Ok(Self {
            cancel,
            handle,
        })
    }

    /// Ask the thread to stop; no completion is sent afterwards.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// `true` once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for WaveformJob {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/waveform.rs"]
mod tests;

use super::*;

fn write_wav(path: &Path, frames: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 1000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        w.write_sample(if i % 2 == 0 { 8000i16 } else { -8000 })
            .unwrap();
    }
    w.finalize().unwrap();
}

#[test]
fn counts_and_rows() {
    let mut c = AudioTrackCollection::new();
    assert_eq!((c.count(), c.row_count()), (0, 0));
    c.set_collapsed(true);
    assert_eq!(c.row_count(), 0);

    let a = c.add(AudioTrack::new("a.wav", "a"));
    let b = c.add(AudioTrack::new("b.wav", "b"));
    assert_ne!(a, b);
    assert_eq!(c.row_count(), 1);
    c.set_collapsed(false);
    assert_eq!(c.row_count(), 2);
    assert_eq!(c.loaded_count(), 0);
    assert!(!c.has_loaded_tracks());
    let order: Vec<&str> = c.iter().map(|t| t.settings.display_name.as_str()).collect();
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn decode_loads_relative_paths_from_root() {
    let dir = tempfile::tempdir().unwrap();
    write_wav(&dir.path().join("beat.wav"), 1500);

    let mut c = AudioTrackCollection::new();
    let id = c.add(AudioTrack::new("beat.wav", "beat"));
    c.start_decode_all(dir.path()).unwrap();
    let events = c.wait(Duration::from_secs(10));

    assert!(events.contains(&WaveformEvent::Loaded(id)));
    assert!(!c.is_decoding());
    let t = c.get(id).unwrap();
    assert!(t.is_loaded());
    assert_eq!(t.waveform_progress(), 1.0);
    assert!((t.duration_ms() - 1500.0).abs() < 1e-9);
    assert_eq!(c.loaded_count(), 1);
    assert!(c.has_loaded_tracks());
}

#[test]
fn failed_decode_keeps_track_unloaded() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = AudioTrackCollection::new();
    let id = c.add(AudioTrack::new("missing.wav", "missing"));
    c.start_decode(id, dir.path()).unwrap();
    let events = c.wait(Duration::from_secs(10));
    assert!(matches!(events.last(), Some(WaveformEvent::Failed(t, _)) if *t == id));
    assert!(!c.get(id).unwrap().is_loaded());
    assert_eq!(c.count(), 1);
}

#[test]
fn stale_and_orphaned_results_are_discarded() {
    let mut c = AudioTrackCollection::new();
    let id = c.add(AudioTrack::new("a.wav", "a"));
    c.get_mut(id).unwrap().generation = 2;

    let summary = crate::audio::track::WaveformSummary {
        duration_ms: 10.0,
        points: Vec::new(),
    };
    c.tx
        .send(WaveformMessage {
            track: id,
            generation: 1,
            update: WaveformUpdate::Done(Ok(summary.clone())),
        })
        .unwrap();
    c.tx
        .send(WaveformMessage {
            track: AudioTrackId(99),
            generation: 2,
            update: WaveformUpdate::Done(Ok(summary.clone())),
        })
        .unwrap();
    assert!(c.poll().is_empty());
    assert!(!c.get(id).unwrap().is_loaded());

    c.tx
        .send(WaveformMessage {
            track: id,
            generation: 2,
            update: WaveformUpdate::Done(Ok(summary)),
        })
        .unwrap();
    assert_eq!(c.poll(), vec![WaveformEvent::Loaded(id)]);
}

#[test]
fn replacing_source_unloads_and_bumps_generation() {
    let mut c = AudioTrackCollection::new();
    let id = c.add(AudioTrack::new("a.wav", "a"));
    c.replace_source(id, "b.wav").unwrap();
    let t = c.get(id).unwrap();
    assert_eq!(t.path(), Path::new("b.wav"));
    assert_eq!(t.generation, 1);
    assert!(c.replace_source(AudioTrackId(42), "x.wav").is_err());
    assert!(c.remove(id).is_some());
    assert_eq!(c.count(), 0);
}

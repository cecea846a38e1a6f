use super::*;
use crate::document::model::RasterDocument;
use crate::foundation::core::Vec2;
use crate::render::surface::Surface;
use crate::timeline::subroutine::ReelSource;
use std::{cell::RefCell, rc::Rc};

const CANVAS: Canvas = Canvas {
    width: 4,
    height: 4,
};

fn recorded(state: &mut CanvasAnimationState) -> Rc<RefCell<Vec<AnimationEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    state.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    log
}

fn doc_with(names: &[&str]) -> (RasterDocument, Vec<LayerId>) {
    let mut doc = RasterDocument::new(CANVAS);
    let ids = names
        .iter()
        .map(|n| doc.add_layer(*n, Surface::new(4, 4)).unwrap())
        .collect();
    (doc, ids)
}

fn synced(names: &[&str]) -> (CanvasAnimationState, RasterDocument, Vec<LayerId>) {
    let (doc, ids) = doc_with(names);
    let mut state = CanvasAnimationState::new(CANVAS);
    state.sync_tracks_from_document(&doc);
    (state, doc, ids)
}

#[test]
fn sync_is_idempotent_and_non_destructive() {
    let (mut doc, ids) = doc_with(&["bg", "ink"]);
    let mut state = CanvasAnimationState::new(CANVAS);
    let log = recorded(&mut state);

    assert!(state.sync_tracks_from_document(&doc));
    assert!(!state.sync_tracks_from_document(&doc));
    assert_eq!(*log.borrow(), vec![AnimationEvent::TracksChanged]);

    state
        .set_layer_keyframe(ids[1], 3, LayerSnapshot::hidden())
        .unwrap();
    doc.rename_layer(ids[1], "lines");
    let fx = doc.add_layer("fx", Surface::new(4, 4)).unwrap();
    doc.remove_layer(ids[0]);
    assert!(state.sync_tracks_from_document(&doc));

    let tracks: Vec<(LayerId, &str)> = state
        .layer_tracks()
        .iter()
        .map(|t| (t.layer_id, t.name.as_str()))
        .collect();
    assert_eq!(tracks, vec![(ids[1], "lines"), (fx, "fx")]);
    assert!(state.layer_track(ids[1]).unwrap().keyframes.has_keyframe_at(3));
    assert!(!state.sync_tracks_from_document(&doc));
}

#[test]
fn frame_count_and_fps_are_validated() {
    let mut state = CanvasAnimationState::new(CANVAS);
    assert!(state.set_frame_count(0).is_err());
    assert!(state.set_fps(0).is_err());
    assert_eq!(state.frame_count(), DEFAULT_FRAME_COUNT);
    assert_eq!(state.fps(), DEFAULT_FPS);
}

#[test]
fn current_frame_clamps_and_follows_shrinking() {
    let mut state = CanvasAnimationState::new(CANVAS);
    state.set_frame_count(10).unwrap();
    state.set_current_frame(99);
    assert_eq!(state.current_frame(), 9);

    let log = recorded(&mut state);
    state.set_frame_count(5).unwrap();
    assert_eq!(state.current_frame(), 4);
    assert_eq!(
        *log.borrow(),
        vec![
            AnimationEvent::FrameCountChanged(5),
            AnimationEvent::CurrentFrameChanged(4)
        ]
    );
}

#[test]
fn shrinking_keeps_orphaned_keyframes() {
    let (mut state, _, ids) = synced(&["a"]);
    state.set_frame_count(20).unwrap();
    state
        .set_layer_keyframe(ids[0], 15, LayerSnapshot::hidden())
        .unwrap();
    state.set_frame_count(10).unwrap();
    assert_eq!(
        state.orphaned_keyframes(),
        vec![(TrackRef::Layer(ids[0]), 15)]
    );
    assert!(state.set_layer_keyframe(ids[0], 12, LayerSnapshot::hidden()).is_err());

    state.set_frame_count(20).unwrap();
    assert!(state.orphaned_keyframes().is_empty());
    assert_eq!(
        state.resolved_layer_state(ids[0], 16),
        Some(&LayerSnapshot::hidden())
    );
}

#[test]
fn navigation_wraps_only_when_looping() {
    let mut state = CanvasAnimationState::new(CANVAS);
    state.set_frame_count(3).unwrap();
    state.last_frame();
    state.next_frame();
    assert_eq!(state.current_frame(), 0);
    state.previous_frame();
    assert_eq!(state.current_frame(), 2);

    state.set_looping(false);
    state.next_frame();
    assert_eq!(state.current_frame(), 2);
    state.first_frame();
    state.previous_frame();
    assert_eq!(state.current_frame(), 0);
    assert_eq!(state.playback_state(), PlaybackState::Stopped);
}

#[test]
fn loop_vs_ping_pong_at_the_last_frame() {
    let mut state = CanvasAnimationState::new(CANVAS);
    state.set_frame_count(10).unwrap();

    state.set_current_frame(9);
    state.play();
    assert!(state.tick());
    assert_eq!(state.current_frame(), 0);

    state.set_ping_pong(true);
    state.set_current_frame(9);
    state.tick();
    assert_eq!(state.current_frame(), 8);
    assert_eq!(state.direction(), Direction::Backward);
    state.tick();
    assert_eq!(state.current_frame(), 7);
}

#[test]
fn playback_stops_at_the_end_without_loop() {
    let mut state = CanvasAnimationState::new(CANVAS);
    state.set_frame_count(3).unwrap();
    state.set_looping(false);
    state.set_current_frame(2);
    state.play();
    state.tick();
    assert_eq!(state.playback_state(), PlaybackState::Stopped);
    assert_eq!(state.current_frame(), 2);
    assert!(!state.tick());
}

#[test]
fn transport_transitions() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let log = recorded(&mut state);
    state.toggle_play_pause();
    assert_eq!(state.playback_state(), PlaybackState::Playing);
    state.tick();
    state.tick();
    state.toggle_play_pause();
    assert_eq!(state.playback_state(), PlaybackState::Paused);
    assert_eq!(state.current_frame(), 2);
    assert!(!state.tick());

    state.stop();
    assert_eq!(state.playback_state(), PlaybackState::Stopped);
    assert_eq!(state.current_frame(), 0);
    assert_eq!(
        log.borrow().last(),
        Some(&AnimationEvent::CurrentFrameChanged(0))
    );
}

#[test]
fn advance_runs_due_ticks_as_one_batch() {
    let mut state = CanvasAnimationState::new(CANVAS);
    state.set_fps(10).unwrap();
    assert_eq!(state.advance(Duration::from_secs(1)), 0, "stopped");

    state.play();
    let log = recorded(&mut state);
    assert_eq!(state.advance(Duration::from_millis(350)), 3);
    assert_eq!(state.current_frame(), 3);
    assert_eq!(*log.borrow(), vec![AnimationEvent::CurrentFrameChanged(3)]);

    state.pause();
    state.play();
    assert_eq!(state.advance(Duration::from_millis(60)), 0, "remainder dropped");
}

#[test]
fn layer_keyframe_edits_fire_once() {
    let (mut state, _, ids) = synced(&["a"]);
    let log = recorded(&mut state);
    let layer = ids[0];

    state.set_layer_keyframe(layer, 2, LayerSnapshot::default()).unwrap();
    assert!(state.move_layer_keyframe(layer, 2, 5).unwrap());
    assert!(!state.move_layer_keyframe(layer, 2, 6).unwrap());
    assert!(state.move_layer_keyframe(layer, 5, 99).is_err());
    assert_eq!(state.remove_layer_keyframe(layer, 5).unwrap(), Some(LayerSnapshot::default()));
    assert_eq!(state.remove_layer_keyframe(layer, 5).unwrap(), None);

    let kf = |frame| AnimationEvent::KeyframeChanged {
        track: TrackRef::Layer(layer),
        frame,
    };
    assert_eq!(*log.borrow(), vec![kf(2), kf(2), kf(5), kf(5)]);
    assert!(state.set_layer_keyframe(LayerId(404), 0, LayerSnapshot::default()).is_err());
}

#[test]
fn record_layer_edit_honours_auto_keyframe() {
    let (mut state, _, ids) = synced(&["a"]);
    state.set_current_frame(4);
    assert!(!state.record_layer_edit(ids[0], LayerSnapshot::hidden()).unwrap());
    assert!(state.layer_track(ids[0]).unwrap().keyframes.is_empty());

    state.set_auto_keyframe(true);
    assert!(state.record_layer_edit(ids[0], LayerSnapshot::hidden()).unwrap());
    state.set_auto_keyframe(false);
    assert!(state.record_layer_edit(ids[0], LayerSnapshot::default()).unwrap());
    assert_eq!(
        state.resolved_layer_state(ids[0], 4),
        Some(&LayerSnapshot::default())
    );
}

#[test]
fn stage_keyframes_interpolate_the_capture_rect() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let mut stage = state.stage().clone();
    stage.enabled = true;
    stage.output_width = 4;
    stage.output_height = 4;
    state.set_stage(stage).unwrap();

    let at = |x: f64| StageSnapshot {
        position: Vec2::new(x, 2.0),
        scale: Vec2::new(2.0, 2.0),
        rotation: 0.0,
    };
    state.set_stage_keyframe(0, at(0.0)).unwrap();
    state.set_stage_keyframe(10, at(10.0)).unwrap();

    let r = state.capture_rect(5);
    assert_eq!((r.x, r.y, r.width, r.height), (4.0, 1.0, 2.0, 2.0));
    assert_eq!(state.resolved_stage(20).unwrap().position, Vec2::new(10.0, 2.0));

    assert!(state.move_stage_keyframe(10, 0).is_err());
    assert!(state.remove_stage_keyframe(10).is_some());
    assert!(state.set_stage(Stage { output_width: 0, ..state.stage().clone() }).is_err());
}

#[test]
fn batch_coalesces_sub_routine_edits() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let log = recorded(&mut state);
    let sub = SubRoutine::new(
        "clip",
        0,
        10,
        ReelSource::Embedded {
            frames: vec![Surface::new(1, 1)],
        },
    )
    .unwrap();

    let id = state.batch(|s| {
        let id = s.add_sub_routine(sub);
        s.update_sub_routine(id, |r| r.drag_right_handle(5)).unwrap();
        s.update_sub_routine(id, |r| r.z_order = 3).unwrap();
        id
    });
    assert_eq!(*log.borrow(), vec![AnimationEvent::SubRoutinesChanged]);
    let s = state.sub_routines().get(id).unwrap();
    assert!(s.is_loaded());
    assert_eq!((s.duration_frames(), s.z_order), (15, 3));
    assert!(state.update_sub_routine(SubRoutineId(77), |_| ()).is_err());
}

#[test]
fn external_reels_without_resolver_stay_unloaded() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let id = state.add_sub_routine(
        SubRoutine::new(
            "sheet",
            0,
            4,
            ReelSource::SpriteSheet {
                path: "walk.png".into(),
                frame_count: 2,
            },
        )
        .unwrap(),
    );
    assert!(!state.sub_routines().get(id).unwrap().is_loaded());
    let warnings = state.load_sub_routines(&EmbeddedReelResolver);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].sub_routine, id);
}

#[test]
fn onion_skin_neighbours_fade_and_clip() {
    let mut state = CanvasAnimationState::new(CANVAS);
    assert!(state.onion_skin_frames().is_empty());
    state.set_onion_skin(OnionSkin {
        enabled: true,
        frames_before: 2,
        frames_after: 1,
        opacity: 0.5,
    });
    state.set_current_frame(1);
    let frames: Vec<(u32, i64, f32)> = state
        .onion_skin_frames()
        .into_iter()
        .map(|o| (o.frame, o.offset, o.opacity))
        .collect();
    assert_eq!(frames, vec![(0, -1, 0.5), (2, 1, 0.5)]);

    state.set_current_frame(5);
    let before: Vec<f32> = state
        .onion_skin_frames()
        .into_iter()
        .filter(|o| o.offset < 0)
        .map(|o| o.opacity)
        .collect();
    assert_eq!(before, vec![0.5, 0.25]);
}

#[test]
fn audio_edits_fire_audio_events() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let log = recorded(&mut state);
    let id = state.add_audio_track(AudioTrack::new("a.wav", "a"));
    state
        .update_audio_track(id, |t| t.settings.start_frame_offset = -5)
        .unwrap();
    state.set_audio_collapsed(true);
    state.set_audio_collapsed(true);
    assert_eq!(log.borrow().len(), 3);
    assert_eq!(
        state.audio_tracks().get(id).unwrap().settings.start_frame_offset,
        -5
    );
    assert!(state.remove_audio_track(id).is_some());
    assert_eq!(state.audio_tracks().row_count(), 0);
}

#[test]
fn replacing_an_audio_source_unloads_and_notifies() {
    let mut state = CanvasAnimationState::new(CANVAS);
    let id = state.add_audio_track(AudioTrack::new("a.wav", "a"));
    let log = recorded(&mut state);

    state.replace_audio_source(id, "b.wav").unwrap();
    let track = state.audio_tracks().get(id).unwrap();
    assert_eq!(track.path(), Path::new("b.wav"));
    assert!(!track.is_loaded());
    assert_eq!(*log.borrow(), vec![AnimationEvent::AudioTracksChanged]);
    assert!(state.replace_audio_source(AudioTrackId(9), "c.wav").is_err());
}

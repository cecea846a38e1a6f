use super::*;

fn snap(x: f64, y: f64, scale: f64) -> StageSnapshot {
    StageSnapshot {
        position: Vec2::new(x, y),
        scale: Vec2::new(scale, scale),
        rotation: 0.0,
    }
}

fn stage() -> Stage {
    Stage {
        enabled: true,
        stage_x: 4,
        stage_y: 8,
        stage_width: 32,
        stage_height: 16,
        output_width: 64,
        output_height: 32,
        scaling: ScalingAlgorithm::NearestNeighbor,
        bounds_mode: BoundsMode::Free,
    }
}

#[test]
fn interpolates_midpoint_and_holds_past_last() {
    let mut track = StageTrack::default();
    track.keyframes.set_keyframe(0, snap(0.0, 0.0, 1.0));
    track.keyframes.set_keyframe(10, snap(100.0, 0.0, 2.0));

    let mid = track.resolve(5).unwrap();
    assert_eq!(mid.position, Vec2::new(50.0, 0.0));
    assert_eq!(mid.scale, Vec2::new(1.5, 1.5));

    assert_eq!(track.resolve(15), Some(snap(100.0, 0.0, 2.0)));
}

#[test]
fn before_first_key_uses_first_unmodified() {
    let mut track = StageTrack::default();
    track.keyframes.set_keyframe(4, snap(10.0, 20.0, 3.0));
    track.keyframes.set_keyframe(8, snap(50.0, 20.0, 1.0));
    assert_eq!(track.resolve(0), Some(snap(10.0, 20.0, 3.0)));
}

#[test]
fn empty_track_falls_back_to_static_rect() {
    let s = stage();
    let track = StageTrack::default();
    assert_eq!(track.resolve(3), None);
    assert_eq!(
        s.capture_rect(track.resolve(3).as_ref()),
        CaptureRect {
            x: 4.0,
            y: 8.0,
            width: 32.0,
            height: 16.0
        }
    );
}

#[test]
fn capture_rect_is_center_based_and_scale_divides_output() {
    let s = stage();
    let r = s.capture_rect(Some(&snap(50.0, 40.0, 2.0)));
    assert_eq!(
        r,
        CaptureRect {
            x: 34.0,
            y: 32.0,
            width: 32.0,
            height: 16.0
        }
    );
}

#[test]
fn scale_axes_are_independent() {
    let s = stage();
    let snapshot = StageSnapshot {
        position: Vec2::new(0.0, 0.0),
        scale: Vec2::new(4.0, 1.0),
        rotation: 0.0,
    };
    let r = s.capture_rect(Some(&snapshot));
    assert_eq!(r.width, 16.0);
    assert_eq!(r.height, 32.0);
}

#[test]
fn static_snapshot_reproduces_static_rect() {
    let s = stage();
    let snapshot = s.static_snapshot();
    assert_eq!(s.capture_rect(Some(&snapshot)), s.static_rect());
}

#[test]
fn bounds_modes_clamp_center() {
    let canvas = Canvas {
        width: 100,
        height: 100,
    };
    let mut s = stage();
    let scale = Vec2::new(2.0, 2.0);
    let far = Vec2::new(-50.0, 500.0);

    assert_eq!(s.clamp_center(far, scale, canvas), far);

    s.bounds_mode = BoundsMode::CenterLocked;
    assert_eq!(s.clamp_center(far, scale, canvas), Vec2::new(0.0, 100.0));

    s.bounds_mode = BoundsMode::Constrained;
    assert_eq!(s.clamp_center(far, scale, canvas), Vec2::new(16.0, 92.0));
}

#[test]
fn validate_rejects_zero_sizes() {
    let mut s = stage();
    assert!(s.validate().is_ok());
    s.output_width = 0;
    assert!(s.validate().is_err());
}

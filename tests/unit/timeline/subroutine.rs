use super::*;

struct FailingResolver;

impl ReelResolver for FailingResolver {
    fn resolve(&self, _source: &ReelSource) -> PixreelResult<Reel> {
        Err(PixreelError::resource("tileset 'forest' not found"))
    }
}

struct EmbeddedOnly;

impl ReelResolver for EmbeddedOnly {
    fn resolve(&self, source: &ReelSource) -> PixreelResult<Reel> {
        match source {
            ReelSource::Embedded { frames } => Reel::new(frames.clone()),
            _ => Err(PixreelError::resource("unsupported")),
        }
    }
}

fn embedded(n: u8) -> ReelSource {
    ReelSource::Embedded {
        frames: (0..n).map(|i| Surface::filled(1, 1, [i, 0, 0, 255])).collect(),
    }
}

fn walker() -> SubRoutine {
    let mut s = SubRoutine::new("walker", 10, 20, embedded(3)).unwrap();
    s.position.set_key(0.0, Vec2::new(0.0, 0.0));
    s.position.set_key(1.0, Vec2::new(100.0, 0.0));
    s
}

#[test]
fn normalized_time_linear_and_ease_in_quad() {
    let mut s = walker();
    assert_eq!(s.normalized_time(20), 0.5);
    assert_eq!(s.resolve_transform(20).position, Vec2::new(50.0, 0.0));

    s.easing = Ease::InQuad;
    assert_eq!(s.resolve_transform(20).position, Vec2::new(25.0, 0.0));
}

#[test]
fn normalized_time_clamps_outside_the_clip() {
    let s = walker();
    assert_eq!(s.normalized_time(0), 0.0);
    assert_eq!(s.normalized_time(30), 1.0);
    assert_eq!(s.normalized_time(99), 1.0);
}

#[test]
fn empty_channels_resolve_to_identity() {
    let s = SubRoutine::new("still", 0, 4, embedded(1)).unwrap();
    assert_eq!(s.resolve_transform(2), SubRoutineTransform::default());
}

#[test]
fn left_handle_keeps_end_and_clamps_duration() {
    let mut s = walker();
    assert!(s.drag_left_handle(5));
    assert_eq!((s.start_frame(), s.duration_frames()), (15, 15));
    assert_eq!(s.end_frame(), 30);

    let mut s = walker();
    s.drag_left_handle(25);
    assert_eq!((s.start_frame(), s.duration_frames()), (29, 1));
    assert_eq!(s.end_frame(), 30);

    let mut s = walker();
    s.drag_left_handle(-50);
    assert_eq!((s.start_frame(), s.duration_frames()), (0, 30));
}

#[test]
fn right_handle_and_body_drag() {
    let mut s = walker();
    s.drag_right_handle(-100);
    assert_eq!((s.start_frame(), s.duration_frames()), (10, 1));
    s.drag_right_handle(9);
    assert_eq!(s.duration_frames(), 10);

    assert!(s.drag_body(-4));
    assert_eq!((s.start_frame(), s.duration_frames()), (6, 10));
    s.drag_body(-100);
    assert_eq!(s.start_frame(), 0);
    assert!(!s.drag_body(0));
}

#[test]
fn zero_duration_is_rejected() {
    assert!(SubRoutine::new("bad", 0, 0, embedded(1)).is_err());
    let mut s = walker();
    assert!(s.set_duration_frames(0).is_err());
    assert_eq!(s.duration_frames(), 20);
}

#[test]
fn reel_loops_within_the_placement() {
    let mut s = walker();
    assert!(s.frame_pixels(10).is_none(), "not loaded yet");
    assert!(s.load_reel(&EmbeddedOnly).is_none());
    assert!(s.is_loaded());

    let red = |f| s.frame_pixels(f).and_then(|p| p.pixel(0, 0)).map(|p| p[0]);
    assert_eq!(red(10), Some(0));
    assert_eq!(red(12), Some(2));
    assert_eq!(red(13), Some(0));
    assert_eq!(red(9), None);
    assert_eq!(red(30), None);
}

#[test]
fn unresolvable_legacy_reel_warns_and_stays_unloaded() {
    let mut subs = SubRoutineCollection::new();
    let legacy = SubRoutine::new(
        "old",
        0,
        8,
        ReelSource::LegacyTiles {
            format_version: 1,
            tileset: "forest".into(),
            tiles: vec![TileCoord { col: 0, row: 0 }],
        },
    )
    .unwrap();
    let id = subs.add(legacy);

    let warnings = subs.load_all(&FailingResolver);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].sub_routine, id);
    assert_eq!(warnings[0].format_version, Some(1));
    assert!(warnings[0].to_string().contains("format v1"));
    assert!(warnings[0].reason.contains("forest"));

    assert_eq!(subs.len(), 1);
    assert!(!subs.get(id).unwrap().is_loaded());
    assert_eq!(subs.renderable_at(0).count(), 0);
}

#[test]
fn collection_assigns_fresh_ids() {
    let mut subs = SubRoutineCollection::new();
    let a = subs.add(walker());
    let b = subs.add(walker());
    assert_ne!(a, b);
    subs.remove(a);
    let c = subs.add(walker());
    assert_ne!(c, b);
    assert_ne!(c, a);
    let names: Vec<SubRoutineId> = subs.iter().map(|s| s.id()).collect();
    assert_eq!(names, vec![b, c]);
}

#[test]
fn channels_survive_serde() {
    let mut s = walker();
    s.rotation.set_key(0.5, 90.0);
    s.z_order = -3;
    let json = serde_json::to_string(&s).unwrap();
    let back: SubRoutine = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
    assert!(!back.is_loaded());
}

#[test]
fn set_source_drops_the_previous_reel() {
    let mut s = walker();
    assert!(s.load_reel(&EmbeddedOnly).is_none());
    assert!(s.frame_pixels(10).is_some());

    let warning = s.set_source(
        ReelSource::SpriteSheet {
            path: "missing.png".into(),
            frame_count: 2,
        },
        &EmbeddedOnly,
    );
    assert!(warning.is_some());
    assert!(!s.is_loaded());
    assert_eq!(s.frame_pixels(10), None);
    assert!(matches!(s.source(), ReelSource::SpriteSheet { .. }));

    assert!(s.set_source(embedded(2), &EmbeddedOnly).is_none());
    assert_eq!(s.reel().map(Reel::len), Some(2));
}

use super::*;

const CANVAS: Canvas = Canvas {
    width: 2,
    height: 1,
};

fn doc() -> (RasterDocument, LayerId, LayerId) {
    let mut d = RasterDocument::new(CANVAS);
    let bottom = d
        .add_layer("bottom", Surface::filled(2, 1, [255, 0, 0, 255]))
        .unwrap();
    let mut top_px = Surface::new(2, 1);
    top_px.set_pixel(1, 0, [0, 255, 0, 255]);
    let top = d.add_layer("top", top_px).unwrap();
    (d, bottom, top)
}

#[test]
fn ids_are_unique_and_order_is_bottom_to_top() {
    let (d, bottom, top) = doc();
    assert_ne!(bottom, top);
    let names: Vec<String> = d.flattened_layers().into_iter().map(|l| l.name).collect();
    assert_eq!(names, vec!["bottom", "top"]);
}

#[test]
fn static_composite_paints_top_over_bottom() {
    let (d, _, _) = doc();
    let mut out = Surface::new(2, 1);
    d.composite_to(&mut out, &LayerOverrides::new()).unwrap();
    assert_eq!(out.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(1, 0), Some([0, 255, 0, 255]));
}

#[test]
fn overrides_hide_replace_and_exclude() {
    let (d, bottom, top) = doc();
    let hidden = LayerSnapshot::hidden();
    let replaced = LayerSnapshot {
        pixels: Some(Surface::filled(2, 1, [0, 0, 255, 255])),
        ..LayerSnapshot::default()
    };

    let mut o = LayerOverrides::new();
    o.set(top, &hidden);
    let mut out = Surface::new(2, 1);
    d.composite_to(&mut out, &o).unwrap();
    assert_eq!(out.pixel(1, 0), Some([255, 0, 0, 255]));

    let mut o = LayerOverrides::new();
    o.set(bottom, &replaced);
    o.exclude(top);
    let mut out = Surface::new(2, 1);
    d.composite_to(&mut out, &o).unwrap();
    assert_eq!(out.pixel(1, 0), Some([0, 0, 255, 255]));
}

#[test]
fn snapshot_offset_shifts_content() {
    let (d, bottom, top) = doc();
    let shifted = LayerSnapshot {
        offset: (-1, 0),
        ..LayerSnapshot::default()
    };
    let mut o = LayerOverrides::new();
    o.set(top, &shifted);
    o.exclude(bottom);
    let mut out = Surface::new(2, 1);
    d.composite_to(&mut out, &o).unwrap();
    assert_eq!(out.pixel(0, 0), Some([0, 255, 0, 255]));
    assert_eq!(out.pixel(1, 0), Some([0, 0, 0, 0]));
}

#[test]
fn mismatched_sizes_are_rejected() {
    let (mut d, _, _) = doc();
    assert!(d.add_layer("bad", Surface::new(3, 3)).is_err());
    let mut wrong = Surface::new(1, 1);
    assert!(d.composite_to(&mut wrong, &LayerOverrides::new()).is_err());
}

#[test]
fn rename_and_remove() {
    let (mut d, bottom, top) = doc();
    assert!(d.rename_layer(top, "ink"));
    assert_eq!(d.layer(top).map(|l| l.name.as_str()), Some("ink"));
    assert!(d.remove_layer(bottom).is_some());
    assert!(d.remove_layer(bottom).is_none());
    assert_eq!(d.layers().len(), 1);
}

use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2);
    assert_eq!(s.pixels().len(), 24);
    assert!(s.pixels().iter().all(|&b| b == 0));
}

#[test]
fn from_pixels_checks_length() {
    assert!(Surface::from_pixels(2, 2, vec![0; 16]).is_ok());
    assert!(Surface::from_pixels(2, 2, vec![0; 15]).is_err());
}

#[test]
fn rgba_conversion_swaps_red_and_blue() {
    let s = Surface::from_rgba8(1, 1, vec![10, 20, 30, 40]).unwrap();
    assert_eq!(s.pixel(0, 0), Some([30, 20, 10, 40]));
    assert_eq!(s.to_rgba8(), vec![10, 20, 30, 40]);
}

#[test]
fn out_of_bounds_access_is_ignored() {
    let mut s = Surface::new(2, 2);
    s.set_pixel(-1, 0, [1, 2, 3, 4]);
    s.set_pixel(2, 0, [1, 2, 3, 4]);
    assert_eq!(s.pixel(5, 5), None);
    assert!(s.pixels().iter().all(|&b| b == 0));
}

#[test]
fn composite_to_clips_at_destination_edges() {
    let src = Surface::filled(2, 2, [0, 0, 255, 255]);
    let mut dst = Surface::new(3, 3);
    src.composite_to(&mut dst, 2, -1, 1.0);
    assert_eq!(dst.pixel(2, 0), Some([0, 0, 255, 255]));
    assert_eq!(dst.pixel(1, 0), Some([0, 0, 0, 0]));
    assert_eq!(dst.pixel(2, 1), Some([0, 0, 0, 0]));
}

#[test]
fn composite_to_with_zero_opacity_is_noop() {
    let src = Surface::filled(1, 1, [9, 9, 9, 255]);
    let mut dst = Surface::filled(1, 1, [1, 2, 3, 255]);
    src.composite_to(&mut dst, 0, 0, 0.0);
    assert_eq!(dst.pixel(0, 0), Some([1, 2, 3, 255]));
}

#[test]
fn crop_copies_region_and_rejects_overflow() {
    let mut s = Surface::new(3, 2);
    s.set_pixel(1, 1, [7, 7, 7, 255]);
    let c = s.crop(1, 1, 2, 1).unwrap();
    assert_eq!((c.width(), c.height()), (2, 1));
    assert_eq!(c.pixel(0, 0), Some([7, 7, 7, 255]));
    assert!(s.crop(2, 0, 2, 1).is_err());
    assert!(s.crop(0, 1, 1, 2).is_err());
}

#[test]
fn deserializing_checks_buffer_length() {
    let ok: Surface =
        serde_json::from_str(r#"{"width":1,"height":1,"pixels":[1,2,3,4]}"#).unwrap();
    assert_eq!(ok.pixel(0, 0), Some([1, 2, 3, 4]));
    assert!(serde_json::from_str::<Surface>(r#"{"width":2,"height":2,"pixels":[1,2,3,255]}"#).is_err());
}

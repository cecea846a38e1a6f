use super::*;

#[test]
fn png_round_trip_keeps_straight_alpha_bgra() {
    let mut s = Surface::new(2, 1);
    s.set_pixel(0, 0, [200, 50, 100, 128]);
    s.set_pixel(1, 0, [1, 2, 3, 255]);

    let png = encode_png(&s).unwrap();
    assert_eq!(&png[1..4], b"PNG");

    let back = decode_image(&png).unwrap();
    assert_eq!(back, s);
}

#[test]
fn garbage_bytes_fail_to_decode() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(err.to_string().contains("decode image"));
}

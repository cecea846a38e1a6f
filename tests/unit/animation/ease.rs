use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in Ease::ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b);
        assert!(b < c);
    }
}

#[test]
fn midpoint_values() {
    assert_eq!(Ease::Linear.apply(0.5), 0.5);
    assert_eq!(Ease::InQuad.apply(0.5), 0.25);
    assert_eq!(Ease::OutQuad.apply(0.5), 0.75);
    assert_eq!(Ease::InCubic.apply(0.5), 0.125);
    assert_eq!(Ease::InOutCubic.apply(0.5), 0.5);
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::InQuad.apply(-1.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(2.0), 1.0);
}

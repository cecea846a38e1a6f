use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PixreelError::keyframe("x")
            .to_string()
            .contains("keyframe error:")
    );
    assert!(
        PixreelError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(PixreelError::render("x").to_string().contains("render error:"));
    assert!(
        PixreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PixreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: PixreelError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, PixreelError::Serde(_)));
}

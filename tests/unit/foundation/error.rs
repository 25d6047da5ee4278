use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ChatreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ChatreelError::input("x").to_string().contains("input error:"));
    assert!(
        ChatreelError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        ChatreelError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(ChatreelError::fetch("x").to_string().contains("fetch error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ChatreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

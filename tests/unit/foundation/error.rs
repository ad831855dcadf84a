use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PipelineError::invalid_topology("x")
            .to_string()
            .contains("invalid topology:")
    );
    assert!(
        PipelineError::invalid_capability("x")
            .to_string()
            .contains("invalid capability:")
    );
    assert!(
        PipelineError::malformed("x")
            .to_string()
            .contains("malformed representation:")
    );
    assert!(
        PipelineError::invalid_parameters("x")
            .to_string()
            .contains("invalid parameters:")
    );
    assert!(
        PipelineError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn structured_variants_render_their_fields() {
    assert_eq!(
        PipelineError::index_out_of_range(4, 3).to_string(),
        "index 4 out of range (len 3)"
    );
    assert_eq!(
        PipelineError::NodeMismatch { index: 1 }.to_string(),
        "node mismatch at index 1"
    );
    assert_eq!(
        PipelineError::unknown_type("Sepia").to_string(),
        "unknown node type 'Sepia'"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PipelineError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

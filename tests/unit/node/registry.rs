use super::*;
use crate::test_support::{Stage, log};

fn registry() -> NodeRegistry {
    let mut r = NodeRegistry::with_builtins();
    r.register("Blur", |params, _root| {
        if params.get("radius").and_then(|v| v.as_f64()).is_none() {
            return Err(PipelineError::invalid_parameters("Blur.radius must be a number"));
        }
        Ok(Stage::new("Blur", &log()).handle())
    })
    .unwrap();
    r
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut r = registry();
    let err = r
        .register("Blur", |_, _| Ok(Stage::new("Blur", &log()).handle()))
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameters(_)));
}

#[test]
fn unknown_type_is_reported_by_name() {
    let err = registry().create("Sepia", &Parameters::new()).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownType(ref t) if t == "Sepia"));
}

#[test]
fn constructor_errors_propagate() {
    let err = registry().create("Blur", &Parameters::new()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidParameters(_)));
}

#[test]
fn type_names_are_sorted_and_include_builtins() {
    let r = registry();
    assert_eq!(r.type_names().collect::<Vec<_>>(), vec!["Blur", "Chain", "FilterGroup"]);
    assert!(r.knows("Chain"));
    assert!(r.knows("FilterGroup"));
    assert!(!NodeRegistry::new().knows("Chain"));
}

#[test]
fn placeholder_factory_falls_back_to_opaque_filters() {
    let r = registry();
    let lenient = PlaceholderFactory::new(&r);
    let factory: &dyn NodeFactory = &lenient;

    assert!(factory.knows("Anything"));
    let node = factory.create("Anything", &Parameters::new()).unwrap();
    assert_eq!(node.type_name(), "Anything");

    let mut params = Parameters::new();
    params.insert("radius".to_string(), serde_json::json!(2));
    let blur = factory.create("Blur", &params).unwrap();
    assert_eq!(blur.type_name(), "Blur");
}

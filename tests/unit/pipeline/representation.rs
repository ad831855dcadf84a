use std::{cell::Cell, rc::Rc};

use super::*;
use crate::node::registry::NodeRegistry;
use crate::test_support::{Stage, log};

fn counting_registry(created: &Rc<Cell<usize>>) -> NodeRegistry {
    let mut r = NodeRegistry::with_builtins();
    for name in ["Sepia", "Blur"] {
        let created = created.clone();
        r.register(name, move |params, _| {
            created.set(created.get() + 1);
            Ok(Stage::new(name, &log())
                .typed(name, serde_json::Value::Object(params.clone()))
                .handle())
        })
        .unwrap();
    }
    r
}

#[test]
fn missing_fields_are_malformed() {
    for value in [
        serde_json::json!({ "items": [] }),
        serde_json::json!({ "name": "C" }),
        serde_json::json!({ "name": "C", "items": [ { "parameters": {} } ] }),
        serde_json::json!({ "name": "C", "items": [ { "type": "Blur", "parameters": 3 } ] }),
        serde_json::json!({ "name": "C", "items": [ { "type": "  " } ] }),
        serde_json::json!(["not", "a", "mapping"]),
    ] {
        let err = ChainRepresentation::from_value(&value).unwrap_err();
        assert!(
            matches!(err, PipelineError::MalformedRepresentation(_)),
            "{value}: {err}"
        );
    }
}

#[test]
fn parameters_default_to_empty() {
    let repr = ChainRepresentation::from_json_str(r#"{ "name": "C", "items": [ { "type": "Sepia" } ] }"#)
        .unwrap();
    assert_eq!(repr.type_names(), vec!["Sepia"]);
    assert!(repr.items[0].parameters.is_empty());
}

#[test]
fn invalid_json_is_a_serde_error() {
    let err = ChainRepresentation::from_json_str("{ name: ").unwrap_err();
    assert!(matches!(err, PipelineError::Serde(_)));
}

#[test]
fn unknown_types_are_rejected_before_any_node_is_built() {
    let created = Rc::new(Cell::new(0));
    let r = counting_registry(&created);
    let repr = ChainRepresentation::from_value(&serde_json::json!({
        "name": "C",
        "items": [ { "type": "Sepia" }, { "type": "Glow" } ]
    }))
    .unwrap();

    let err = repr.instantiate(&r, &LoadOpts::default()).unwrap_err();
    assert!(matches!(err, PipelineError::MalformedRepresentation(ref m) if m.contains("Glow")));
    assert_eq!(created.get(), 0);
}

#[test]
fn placeholder_policy_keeps_unknown_items() {
    let created = Rc::new(Cell::new(0));
    let r = counting_registry(&created);
    let repr = ChainRepresentation::from_value(&serde_json::json!({
        "name": "C",
        "items": [ { "type": "Sepia" }, { "type": "Glow", "parameters": { "amount": 3 } } ]
    }))
    .unwrap();

    let opts = LoadOpts {
        unknown_types: UnknownTypePolicy::Placeholder,
    };
    let chain = repr.instantiate(&r, &opts).unwrap();
    assert_eq!(created.get(), 1);
    assert_eq!(chain.representation(), repr);
}

#[test]
fn missing_file_is_reported_with_path() {
    let err = ChainRepresentation::from_path("target/does/not/exist.json").unwrap_err();
    assert!(err.to_string().contains("exist.json"));
}

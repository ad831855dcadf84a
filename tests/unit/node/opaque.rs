use super::*;
use crate::test_support::{Stage, frame, log};

fn params(v: serde_json::Value) -> Parameters {
    match v {
        serde_json::Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

#[test]
fn keeps_type_and_parameters_verbatim() {
    let mut f = OpaqueFilter::new("Vignette", params(serde_json::json!({ "radius": 0.75 })));
    assert_eq!(f.type_name(), "Vignette");
    assert_eq!(f.parameter("radius"), Some(&serde_json::json!(0.75)));

    f.set_parameter("radius", serde_json::json!(0.5));
    assert_eq!(
        f.parameters().unwrap().get("radius"),
        Some(&serde_json::json!(0.5))
    );
}

#[test]
fn forwards_frames_unchanged() {
    let log = log();
    let sink = Stage::sink("S", &log).handle();
    let opaque = NodeHandle::new(OpaqueFilter::new("X", Parameters::new()));
    opaque.link(&sink).unwrap();

    opaque.push_frame(&frame(7), 0).unwrap();
    assert_eq!(*log.borrow(), vec!["S"]);
}

#[test]
fn duplicate_is_unwired() {
    let log = log();
    let opaque = NodeHandle::new(OpaqueFilter::new("X", Parameters::new()));
    opaque.link(&Stage::sink("S", &log).handle()).unwrap();

    let copy = opaque.borrow().duplicate().unwrap();
    assert!(!copy.ptr_eq(&opaque));
    assert_eq!(copy.type_name(), "X");
    assert!(copy.targets().is_empty());
}

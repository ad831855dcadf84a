use super::*;
use crate::test_support::{Stage, frame, log};

#[test]
fn add_ignores_duplicates_and_keeps_order() {
    let log = log();
    let a = Stage::new("A", &log).handle();
    let b = Stage::new("B", &log).handle();

    let mut targets = Targets::new();
    targets.add(a.clone(), 0);
    targets.add(b.clone(), 1);
    targets.add(a.clone(), 5);

    assert_eq!(targets.len(), 2);
    assert_eq!(targets.input_index_of(&a), Some(0));
    assert_eq!(targets.input_index_of(&b), Some(1));
    assert_eq!(targets.remove(&a), Some(0));
    assert!(!targets.contains(&a));
    assert_eq!(targets.remove(&a), None);
}

#[test]
fn push_frame_fans_out_in_attachment_order() {
    let log = log();
    let a = Stage::sink("A", &log).handle();
    let b = Stage::sink("B", &log).handle();

    let mut targets = Targets::new();
    targets.add(b, 0);
    targets.add(a, 0);
    targets.push_frame(&frame(0)).unwrap();

    assert_eq!(*log.borrow(), vec!["B", "A"]);
}

#[test]
fn push_notice_reaches_every_target() {
    let log = log();
    let mut targets = Targets::new();
    targets.add(Stage::sink("A", &log).handle(), 0);
    targets.add(Stage::sink("B", &log).handle(), 0);
    targets.push_notice(&Notice::EndProcessing).unwrap();

    assert_eq!(*log.borrow(), vec!["A!", "B!"]);
}

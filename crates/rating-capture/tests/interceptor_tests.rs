//! End-to-end capture through a real buffer file

use pretty_assertions::assert_eq;
use rating_capture::*;
use rating_capture_test_utils::{movie_entity, rating_entity, user_entity, TempBuffer};

#[test]
fn created_then_updated_rating() {
    let buffer = TempBuffer::new();
    let (interceptor, diag) = buffer.interceptor();

    interceptor.on_after_save(&rating_entity(7, 42, 4.5));
    assert_eq!(buffer.lines(), vec!["NEW#7#42#4.5"]);

    interceptor.on_after_update(&rating_entity(7, 42, 5.0));
    assert_eq!(buffer.lines(), vec!["NEW#7#42#4.5", "UPDATE#7#42#5.0"]);
    assert_eq!(buffer.contents(), "NEW#7#42#4.5\nUPDATE#7#42#5.0\n");

    assert!(diag.failures().is_empty());
}

#[test]
fn non_rating_entities_write_nothing() {
    let buffer = TempBuffer::new();
    let (interceptor, diag) = buffer.interceptor();

    for entity in [user_entity(1), movie_entity(2)] {
        assert_eq!(interceptor.on_after_save(&entity), None);
        assert_eq!(interceptor.on_after_update(&entity), None);
    }

    assert!(!buffer.path().exists());
    assert_eq!(diag.events().len(), 4);
    assert!(diag.failures().is_empty());
}

#[test]
fn n_calls_give_n_lines_in_call_order() {
    let buffer = TempBuffer::new();
    let (interceptor, _) = buffer.interceptor();

    let mut expected = Vec::new();
    for i in 0..50u64 {
        let value = RatingValue::new(0.5 * (i % 10) as f64).unwrap();
        let entity = rating_entity(i, i * 2, value.get());
        if i % 3 == 0 {
            interceptor.on_after_update(&entity);
            expected.push(format!("UPDATE#{}#{}#{}", i, i * 2, value));
        } else {
            interceptor.on_after_save(&entity);
            expected.push(format!("NEW#{}#{}#{}", i, i * 2, value));
        }

        // earlier lines are never rewritten
        let lines = buffer.lines();
        assert_eq!(lines.len(), expected.len());
        assert_eq!(lines, expected);
    }
}

#[test]
fn formatting_is_idempotent() {
    let buffer = TempBuffer::new();
    let (interceptor, _) = buffer.interceptor();
    let entity = rating_entity(3, 9, 2.0);

    interceptor.on_after_save(&entity);
    interceptor.on_after_save(&entity);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
}

#[test]
fn records_survive_reopen() {
    let buffer = TempBuffer::new();
    {
        let (interceptor, _) = buffer.interceptor();
        interceptor.on_after_save(&rating_entity(1, 1, 1.0));
    }

    // a fresh writer on the same path appends after existing content
    let (interceptor, diag) = buffer.interceptor();
    interceptor.on_after_save(&rating_entity(2, 2, 2.0));

    assert_eq!(buffer.lines(), vec!["NEW#1#1#1.0", "NEW#2#2#2.0"]);
    assert!(!diag
        .events()
        .iter()
        .any(|e| matches!(e, CaptureEvent::BufferCreated { .. })));
}

#[test]
fn persistence_listener_as_trait_object() {
    let buffer = TempBuffer::new();
    let (interceptor, _) = buffer.interceptor();
    let listeners: Vec<Box<dyn PersistenceListener>> = vec![Box::new(interceptor)];

    for listener in &listeners {
        listener.after_save(&rating_entity(5, 6, 3.5));
        listener.after_update(&user_entity(5));
    }

    let scan = scan_buffer(buffer.path()).unwrap();
    assert_eq!(scan.count(ChangeKind::Created), 1);
    assert_eq!(scan.count(ChangeKind::Updated), 0);
    assert!(scan.is_clean());
}

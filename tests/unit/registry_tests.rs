//! Unit tests for `BreakpointRegistry`: indexing, replacement, removal,
//! reset, renumbering and reconciliation.

use debugger_session::breakpoints::{BreakpointRegistry, RemoveMode};
use debugger_session::observer::TracingObserver;

use crate::support::{recording_observer, Call, Observed, RecordingDriver};

fn registry() -> BreakpointRegistry {
    BreakpointRegistry::new(TracingObserver::shared())
}

fn locations(registry: &BreakpointRegistry) -> Vec<String> {
    registry.iter().map(|bp| bp.location()).collect()
}

// ── add ───────────────────────────────────────────────────────────────────────

#[test]
fn add_assigns_increasing_indices_in_insertion_order() {
    let mut registry = registry();

    let first = registry.add("a.c", 1, false, "", None);
    let second = registry.add("b.c", 2, false, "", None);
    let third = registry.add("a.c", 3, true, "int x;", None);

    assert_eq!((first, second, third), (1, 2, 3));
    assert_eq!(locations(&registry), ["a.c:1", "b.c:2", "a.c:3"]);
    assert_eq!(registry.get(2).unwrap().line_text, "int x;");
    assert_eq!(registry.last_index(), 3);
}

#[test]
fn add_without_driver_dispatches_nothing_and_leaves_unset() {
    let mut registry = registry();

    registry.add("a.c", 1, false, "", None);

    assert!(!registry.get(0).unwrap().already_set);
}

#[test]
fn add_with_driver_forwards_and_marks_set() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();

    let index = registry.add("a.c", 10, true, "", Some(&mut driver));

    assert_eq!(
        driver.calls(),
        [Call::Add {
            index,
            location: "a.c:10".into(),
            temporary: true,
        }]
    );
    assert!(registry.get(0).unwrap().already_set);
}

/// Adding at an occupied location replaces the occupant: the old
/// breakpoint is removed from the driver before the new one is added.
#[test]
fn add_at_same_location_replaces_previous() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();

    registry.add("main.c", 10, false, "", Some(&mut driver));
    let index = registry.add("main.c", 10, true, "", Some(&mut driver));

    assert_eq!(registry.len(), 1);
    let bp = registry.get(0).unwrap();
    assert!(bp.temporary);
    assert_eq!(bp.index, index);
    assert_eq!(index, 2);
    assert_eq!(
        driver.calls(),
        [
            Call::Add {
                index: 1,
                location: "main.c:10".into(),
                temporary: false,
            },
            Call::Remove(Some(1)),
            Call::Add {
                index: 2,
                location: "main.c:10".into(),
                temporary: true,
            },
        ]
    );
}

#[test]
fn locations_stay_unique_across_mixed_operations() {
    let mut registry = registry();

    for (file, line) in [("a.c", 1), ("b.c", 1), ("a.c", 1), ("a.c", 2), ("b.c", 1)] {
        registry.add(file, line, false, "", None);
    }
    registry.remove("a.c", 2, RemoveMode::Destroy, None);
    registry.add("a.c", 2, true, "", None);
    registry.add("a.c", 1, true, "", None);

    let mut seen = locations(&registry);
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total, "duplicate location in registry");
    assert_eq!(total, 3);
}

#[test]
fn filenames_are_compared_exactly() {
    let mut registry = registry();

    registry.add("src/a.c", 1, false, "", None);
    registry.add("./src/a.c", 1, false, "", None);

    assert_eq!(registry.len(), 2);
}

// ── find / lookup ─────────────────────────────────────────────────────────────

#[test]
fn find_returns_position_or_none() {
    let mut registry = registry();
    registry.add("a.c", 1, false, "", None);
    registry.add("b.c", 2, false, "", None);

    assert_eq!(registry.find("b.c", 2), Some(1));
    assert_eq!(registry.find("b.c", 3), None);
    assert_eq!(registry.find("c.c", 2), None);
}

/// Every comparison made by a lookup is reported to the observer.
#[test]
fn find_reports_each_comparison_to_observer() {
    let (observer, shared) = recording_observer();
    let mut registry = BreakpointRegistry::new(shared);
    registry.add("a.c", 1, false, "", None);
    registry.add("b.c", 2, false, "", None);
    observer.take();

    let _ = registry.find("c.c", 9);
    assert_eq!(
        observer.take(),
        [
            Observed::LookupStarted("c.c".into(), 9),
            Observed::LookupCompared("a.c".into(), 1),
            Observed::LookupCompared("b.c".into(), 2),
            Observed::LookupMissed("c.c".into(), 9),
        ]
    );

    let _ = registry.find("a.c", 1);
    assert_eq!(
        observer.take(),
        [
            Observed::LookupStarted("a.c".into(), 1),
            Observed::LookupCompared("a.c".into(), 1),
        ]
    );
}

#[test]
fn by_number_scans_stable_index() {
    let mut registry = registry();
    registry.add("a.c", 1, false, "", None);
    registry.add("b.c", 2, false, "", None);
    registry.remove_at(0, RemoveMode::Destroy, None);

    assert_eq!(registry.by_number(2).unwrap().filename, "b.c");
    assert!(registry.by_number(1).is_none());
    assert_eq!(registry.get(0).unwrap().index, 2);
}

// ── remove ────────────────────────────────────────────────────────────────────

#[test]
fn remove_detach_returns_breakpoint() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    let index = registry.add("a.c", 4, false, "ret", Some(&mut driver));
    driver.take_calls();

    let bp = registry
        .remove("a.c", 4, RemoveMode::Detach, Some(&mut driver))
        .expect("detached breakpoint");

    assert_eq!(bp.index, index);
    assert_eq!(bp.line_text, "ret");
    assert!(registry.is_empty());
    assert_eq!(driver.calls(), [Call::Remove(Some(index))]);
}

#[test]
fn remove_destroy_returns_none_but_removes() {
    let mut registry = registry();
    registry.add("a.c", 4, false, "", None);

    assert!(registry
        .remove("a.c", 4, RemoveMode::Destroy, None)
        .is_none());
    assert!(registry.is_empty());
}

#[test]
fn remove_missing_location_is_noop() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 4, false, "", None);

    let removed = registry.remove("a.c", 5, RemoveMode::Detach, Some(&mut driver));

    assert!(removed.is_none());
    assert_eq!(registry.len(), 1);
    assert!(driver.calls().is_empty());
}

#[test]
fn remove_at_out_of_range_returns_none() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, false, "", None);

    assert!(registry
        .remove_at(1, RemoveMode::Detach, Some(&mut driver))
        .is_none());
    assert!(registry
        .remove_at(usize::MAX, RemoveMode::Detach, None)
        .is_none());
    assert_eq!(registry.len(), 1);
    assert!(driver.calls().is_empty());
}

#[test]
fn remove_all_for_file_keeps_other_files() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, false, "", Some(&mut driver));
    registry.add("b.c", 2, false, "", Some(&mut driver));
    registry.add("a.c", 3, false, "", Some(&mut driver));
    driver.take_calls();

    let removed = registry.remove_all(Some("a.c"), RemoveMode::Detach, Some(&mut driver));

    assert_eq!(locations(&registry), ["b.c:2"]);
    let removed: Vec<String> = removed.iter().map(|bp| bp.location()).collect();
    assert_eq!(removed, ["a.c:1", "a.c:3"]);
    // Removal walks from the end.
    assert_eq!(driver.calls(), [Call::Remove(Some(3)), Call::Remove(Some(1))]);
}

#[test]
fn remove_all_without_or_with_empty_filename_clears_everything() {
    for filename in [None, Some("")] {
        let mut registry = registry();
        registry.add("a.c", 1, false, "", None);
        registry.add("b.c", 2, false, "", None);

        let removed = registry.remove_all(filename, RemoveMode::Destroy, None);

        assert!(removed.is_empty(), "destroy mode returns nothing");
        assert!(registry.is_empty());
    }
}

// ── reset ─────────────────────────────────────────────────────────────────────

#[test]
fn reset_reindexes_and_preserves_fields() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, true, "x++;", Some(&mut driver));
    registry.add("b.c", 2, false, "", Some(&mut driver));
    driver.take_calls();

    let index = registry.reset(0, Some(&mut driver)).expect("in range");

    assert_eq!(index, 3);
    assert_eq!(locations(&registry), ["b.c:2", "a.c:1"]);
    let bp = registry.by_number(3).unwrap();
    assert_eq!(bp.filename, "a.c");
    assert_eq!(bp.line, 1);
    assert!(bp.temporary);
    assert_eq!(bp.line_text, "x++;");
    assert_eq!(
        driver.calls(),
        [
            Call::Remove(Some(1)),
            Call::Add {
                index: 3,
                location: "a.c:1".into(),
                temporary: true,
            },
        ]
    );
}

#[test]
fn reset_out_of_range_is_noop() {
    let mut registry = registry();
    registry.add("a.c", 1, false, "", None);

    assert!(registry.reset(5, None).is_none());
    assert_eq!(registry.last_index(), 1);
    assert_eq!(registry.len(), 1);
}

// ── renumber ──────────────────────────────────────────────────────────────────

#[test]
fn renumber_makes_indices_contiguous_in_order() {
    let mut registry = registry();
    for line in 1..=5 {
        registry.add("a.c", line, false, "", None);
    }
    registry.remove("a.c", 2, RemoveMode::Destroy, None);
    registry.remove("a.c", 4, RemoveMode::Destroy, None);

    registry.renumber();

    let indices: Vec<u32> = registry.iter().map(|bp| bp.index).collect();
    assert_eq!(indices, [1, 2, 3]);
    assert_eq!(registry.last_index(), 3);
    assert_eq!(registry.add("b.c", 1, false, "", None), 4);
}

#[test]
fn renumber_empty_registry_restarts_at_one() {
    let mut registry = registry();
    registry.add("a.c", 1, false, "", None);
    registry.clear();

    registry.renumber();

    assert_eq!(registry.add("a.c", 1, false, "", None), 1);
}

// ── apply_all ─────────────────────────────────────────────────────────────────

#[test]
fn apply_all_without_driver_changes_nothing() {
    let mut registry = registry();
    registry.add("a.c", 1, true, "", None);
    registry.mark_set(1);

    registry.apply_all(None);

    assert_eq!(registry.len(), 1, "cull step needs a live driver");
}

#[test]
fn apply_all_clears_backend_then_readds_in_reverse() {
    let (observer, shared) = recording_observer();
    let mut registry = BreakpointRegistry::new(shared);
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, false, "", None);
    registry.add("b.c", 2, false, "", None);
    registry.add("c.c", 3, false, "", None);
    observer.take();

    registry.apply_all(Some(&mut driver));

    let add = |index: u32, location: &str| Call::Add {
        index,
        location: location.into(),
        temporary: false,
    };
    assert_eq!(
        driver.calls(),
        [
            Call::Remove(None),
            add(3, "c.c:3"),
            add(2, "b.c:2"),
            add(1, "a.c:1"),
        ]
    );
    assert_eq!(observer.take(), [Observed::Applying(3)]);
    assert!(registry.iter().all(|bp| bp.already_set));
}

/// A temporary breakpoint added before the session is armed by the first
/// reconciliation and culled by the second.
#[test]
fn temporary_breakpoint_survives_one_apply_cycle() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, true, "", None);
    registry.add("b.c", 2, false, "", None);

    registry.apply_all(Some(&mut driver));
    assert_eq!(registry.len(), 2);
    assert!(registry.get(0).unwrap().already_set);
    driver.take_calls();

    registry.apply_all(Some(&mut driver));
    assert_eq!(locations(&registry), ["b.c:2"]);
    // Culled without a targeted remove.
    assert_eq!(
        driver.calls(),
        [
            Call::Remove(None),
            Call::Add {
                index: 2,
                location: "b.c:2".into(),
                temporary: false,
            },
        ]
    );
}

#[test]
fn apply_all_culls_set_temporaries_and_keeps_permanent_ones() {
    let mut registry = registry();
    let mut driver = RecordingDriver::new();
    registry.add("a.c", 1, true, "", Some(&mut driver));
    registry.add("a.c", 2, false, "", Some(&mut driver));
    registry.add("a.c", 3, true, "", None);
    registry.mark_set(2);

    registry.apply_all(Some(&mut driver));

    assert_eq!(locations(&registry), ["a.c:2", "a.c:3"]);
}

#[test]
fn mark_set_reports_unknown_index() {
    let mut registry = registry();
    registry.add("a.c", 1, false, "", None);

    assert!(registry.mark_set(1));
    assert!(registry.get(0).unwrap().already_set);
    assert!(!registry.mark_set(42));
}

// Integration tests for the snapshot history.
//
// These walk through editing sessions the way the editor drives the log:
// commits on input/blur, undo/redo from shortcuts, and overflow.

use rich_pad_mod_history::{HistoryConfig, HistoryManager, Snapshot};

fn contents(mgr: &HistoryManager) -> Vec<String> {
    mgr.entries().map(|s| s.to_string()).collect()
}

// ── Typing Session ─────────────────────────────────────────────────────

#[test]
fn test_end_to_end_typing_session() {
    let mut mgr = HistoryManager::default();
    mgr.commit("<p>a</p>");
    mgr.commit("<p>ab</p>");

    assert_eq!(mgr.undo(), Some(Snapshot::from("<p>a</p>")));
    assert_eq!(mgr.redo(), Some(Snapshot::from("<p>ab</p>")));

    mgr.undo();
    mgr.commit("<p>x</p>");
    assert_eq!(contents(&mgr), vec!["<p>a</p>", "<p>x</p>"]);
    assert_eq!(mgr.index(), Some(1));
    assert!(!mgr.can_redo());
}

#[test]
fn test_blur_after_input_does_not_add_entry() {
    let mut mgr = HistoryManager::with_initial(HistoryConfig::default(), "");
    // input event
    assert!(mgr.commit("<p>hello</p>"));
    // blur event fires with the same markup
    assert!(!mgr.commit("<p>hello</p>"));
    assert_eq!(mgr.len(), 2);
    assert_eq!(mgr.undo().unwrap(), "");
}

// ── Overflow ───────────────────────────────────────────────────────────

#[test]
fn test_overflow_keeps_most_recent_states() {
    let max_states = 50;
    let mut mgr = HistoryManager::new(HistoryConfig::with_max_states(max_states));
    for i in 0..max_states + 5 {
        mgr.commit(format!("<p>{i}</p>"));
    }

    assert_eq!(mgr.len(), max_states);
    assert_eq!(mgr.index(), Some(max_states - 1));
    assert_eq!(mgr.current().unwrap().as_str(), "<p>54</p>");
    assert_eq!(mgr.entries().next().unwrap().as_str(), "<p>5</p>");

    let mut undone = 0;
    while mgr.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, max_states - 1);
    assert_eq!(mgr.current().unwrap().as_str(), "<p>5</p>");
}

#[test]
fn test_branch_after_overflow() {
    let mut mgr = HistoryManager::new(HistoryConfig::with_max_states(4));
    for s in ["a", "b", "c", "d", "e", "f"] {
        mgr.commit(s);
    }
    assert_eq!(contents(&mgr), vec!["c", "d", "e", "f"]);

    mgr.undo();
    mgr.undo();
    mgr.commit("x");
    assert_eq!(contents(&mgr), vec!["c", "d", "x"]);
    assert!(mgr.redo().is_none());
    assert!(mgr.can_undo());
}

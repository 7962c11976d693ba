// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identical_outputs_produce_empty_diff() {
    let text = "interface Gi0/1\n shutdown\n";
    assert_eq!(unified_diff(text, text), "");
}

#[test]
fn changed_line_appears_with_headers() {
    let pre = "vlan 10\nname old\n";
    let post = "vlan 10\nname new\n";
    let diff = unified_diff(pre, post);

    assert!(diff.contains("--- pre"));
    assert!(diff.contains("+++ post"));
    assert!(diff.contains("-name old"));
    assert!(diff.contains("+name new"));
}

#[test]
fn missing_trailing_newline_is_visible() {
    let diff = unified_diff("a\nb\n", "a\nb");
    assert!(diff.contains("b"));
    // similar renders the POSIX missing-newline marker.
    assert!(diff.contains("\\ No newline at end of file"));
}

#[test]
fn maybe_diff_requires_both_sides() {
    assert!(maybe_diff(Some("a"), None).is_none());
    assert!(maybe_diff(None, Some("b")).is_none());
    assert!(maybe_diff(None, None).is_none());
    assert!(maybe_diff(Some("a\n"), Some("b\n")).is_some());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified diff between pre- and post-apply verification output.

use similar::TextDiff;

/// Line-oriented unified diff with `pre`/`post` headers.
///
/// Trailing-newline differences are preserved: `similar` marks a missing
/// final newline the way `diff -u` does.
pub fn unified_diff(pre: &str, post: &str) -> String {
    TextDiff::from_lines(pre, post)
        .unified_diff()
        .header("pre", "post")
        .to_string()
}

/// Diff only when both sides were captured.
pub fn maybe_diff(pre: Option<&str>, post: Option<&str>) -> Option<String> {
    match (pre, post) {
        (Some(pre), Some(post)) => Some(unified_diff(pre, post)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;

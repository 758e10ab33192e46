// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

use corral::parser::parse;
use corral::planner::sanitize_label;

#[derive(Arbitrary, Debug)]
struct Input {
    reply: String,
    files: Vec<String>,
}

fuzz_target!(|input: Input| {
    let mut known: Vec<String> = input.files;
    known.sort();
    known.dedup();

    let assignment = parse(&input.reply, &known);

    // Every known file exactly once, nothing else.
    assert_eq!(assignment.len(), known.len());
    let seen: HashSet<&str> = assignment.entries().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(seen.len(), known.len());
    assert!(seen.iter().all(|n| known.iter().any(|k| k == n)));

    for (_, label) in assignment.categorized() {
        if let Some(folder) = sanitize_label(label, 64) {
            assert!(!folder.contains('/') && !folder.contains('\\'));
            assert!(folder != "." && folder != "..");
        }
    }
});

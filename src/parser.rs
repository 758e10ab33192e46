// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Parse a free-text oracle reply into per-file placements
//!
//! The grammar is one `<filename> -> <category>` pair per line. Everything
//! else is ignored, names outside the known file set are dropped, and every
//! known file ends up with exactly one [`Placement`]. Parsing never fails.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Separator between filename and category
pub const ARROW: &str = "->";

/// Category the oracle uses for "leave it uncategorized"
pub const ROOT_MARKER: &str = "(root)";

/// Where the oracle put a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum Placement {
    /// Assigned to a named category
    Categorized(String),
    /// Explicitly left uncategorized (`(root)` or an empty category)
    Root,
    /// Never mentioned by the oracle
    Unmatched,
}

impl Placement {
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Categorized(label) => Some(label),
            Self::Root | Self::Unmatched => None,
        }
    }
}

/// Placement of every known file, in first-mention order followed by the
/// files the oracle never mentioned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAssignment {
    entries: Vec<(String, Placement)>,
}

impl ParsedAssignment {
    /// Every known file marked as [`Placement::Unmatched`]
    pub fn all_unmatched(known: &[String]) -> Self {
        parse("", known)
    }

    pub fn entries(&self) -> &[(String, Placement)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn placement(&self, filename: &str) -> Option<&Placement> {
        self.entries
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, placement)| placement)
    }

    /// `(filename, category)` pairs
    pub fn categorized(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(name, p)| p.label().map(|label| (name.as_str(), label)))
    }

    /// Files the oracle explicitly marked `(root)` or left blank
    pub fn root(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, p)| *p == Placement::Root)
            .map(|(name, _)| name.as_str())
    }

    /// Files the oracle never mentioned
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, p)| *p == Placement::Unmatched)
            .map(|(name, _)| name.as_str())
    }
}

/// Parse `raw_text` against the snapshot of filenames in `known`
pub fn parse(raw_text: &str, known: &[String]) -> ParsedAssignment {
    let known_set: HashSet<&str> = known.iter().map(String::as_str).collect();
    let mut order: Vec<&str> = Vec::new();
    let mut placements: HashMap<&str, Placement> = HashMap::new();

    for (number, line) in raw_text.lines().enumerate() {
        let (name_part, category_part) = match line.split_once(ARROW) {
            Some(parts) => parts,
            None => continue,
        };

        let name = match resolve_name(name_part, &known_set) {
            Some(name) => name,
            None => {
                debug!("Ignoring reply line {}: {:?} is not a known file", number + 1, name_part.trim());
                continue;
            }
        };

        let placement = classify(category_part);
        if placements.insert(name, placement).is_some() {
            debug!("{} mentioned again on line {}; later assignment wins", name, number + 1);
        } else {
            order.push(name);
        }
    }

    for name in known {
        if !placements.contains_key(name.as_str()) {
            placements.insert(name.as_str(), Placement::Unmatched);
            order.push(name.as_str());
        }
    }

    let entries = order
        .into_iter()
        .filter_map(|name| placements.remove(name).map(|p| (name.to_string(), p)))
        .collect();

    ParsedAssignment { entries }
}

/// Match the left side of a line to a known filename, exact first, then with
/// list decoration removed
fn resolve_name<'k>(part: &str, known: &HashSet<&'k str>) -> Option<&'k str> {
    let trimmed = part.trim();
    if let Some(name) = known.get(trimmed).copied() {
        return Some(name);
    }

    let cleaned = strip_wrapping(strip_list_marker(trimmed));
    known.get(cleaned).copied()
}

fn classify(part: &str) -> Placement {
    let category = strip_wrapping(part.trim());
    if category.is_empty() || category.eq_ignore_ascii_case(ROOT_MARKER) {
        Placement::Root
    } else {
        Placement::Categorized(category.to_string())
    }
}

/// Drop a leading `-`, `*`, `•` bullet or a `1.` / `1)` ordinal
fn strip_list_marker(s: &str) -> &str {
    match s.chars().next() {
        Some(c @ ('-' | '*' | '•')) => {
            let rest = &s[c.len_utf8()..];
            if rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                s
            }
        }
        Some(c) if c.is_ascii_digit() => {
            let digits_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
            let rest = &s[digits_end..];
            match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                Some(after) if after.starts_with(char::is_whitespace) => after.trim_start(),
                _ => s,
            }
        }
        _ => s,
    }
}

/// Peel matching `**`, backtick and quote pairs off both ends
fn strip_wrapping(mut s: &str) -> &str {
    loop {
        let before = s;
        for wrapper in ["**", "`", "\"", "'"] {
            if s.len() >= 2 * wrapper.len() && s.starts_with(wrapper) && s.ends_with(wrapper) {
                s = s[wrapper.len()..s.len() - wrapper.len()].trim();
            }
        }
        if s == before {
            return s;
        }
    }
}

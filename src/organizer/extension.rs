// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Extension strategy: deterministic, driven by the category table

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::{OrganizeReport, Organizer};
use crate::cancel::CancelToken;
use crate::planner::Planner;

impl Organizer {
    pub(super) fn run_extension(
        &self,
        directory: &Path,
        files: &[String],
        report: &mut OrganizeReport,
        cancel: &CancelToken,
    ) {
        let mut planner = Planner::new(directory, &self.config.rules);

        for name in files {
            match category_for(name, &self.config.categories) {
                Some(label) => {
                    planner.place(name, Some(&label));
                }
                None => {
                    debug!("No category for {}, leaving it in place", name);
                    report.left_in_place.push(directory.join(name));
                }
            }
        }

        self.execute_plan(planner.finish(), report, cancel);
    }
}

/// Folder label for a filename, or `None` when no category lists its extension.
///
/// Categories are searched in label order; the first one listing the
/// lowercased extension wins.
pub fn category_for(filename: &str, categories: &BTreeMap<String, Vec<String>>) -> Option<String> {
    let extension = Path::new(filename).extension()?.to_str()?;
    let dotted = format!(".{}", extension.to_lowercase());

    categories
        .iter()
        .find(|(_, extensions)| extensions.iter().any(|e| e.to_lowercase() == dotted))
        .map(|(label, _)| capitalize(label))
}

/// First character upper case, the rest lower case
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

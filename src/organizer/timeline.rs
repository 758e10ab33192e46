// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Timeline strategy: one folder per creation month

use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::{OrganizeReport, Organizer};
use crate::cancel::CancelToken;
use crate::planner::Planner;

impl Organizer {
    pub(super) fn run_timeline(
        &self,
        directory: &Path,
        files: &[String],
        report: &mut OrganizeReport,
        cancel: &CancelToken,
    ) {
        let mut planner = Planner::new(directory, &self.config.rules);

        for name in files {
            let label = month_label(&directory.join(name), &self.config.rules.unknown_date);
            planner.place(name, Some(&label));
        }

        self.execute_plan(planner.finish(), report, cancel);
    }
}

/// `"<Month> <Year>"` of the file's creation time in local time, or
/// `unknown` when the platform cannot report one
pub fn month_label(path: &Path, unknown: &str) -> String {
    match fs::metadata(path).and_then(|m| m.created()) {
        Ok(created) => {
            let local: DateTime<Local> = created.into();
            local.format("%B %Y").to_string()
        }
        Err(e) => {
            debug!("No creation time for {:?}: {}", path, e);
            unknown.to_string()
        }
    }
}

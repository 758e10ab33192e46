// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Intent strategy: sample each file and ask what should happen with it next
//!
//! Files are handled one at a time and independently: a failed oracle call
//! or a failed move only affects that file.

use std::path::Path;
use tracing::{debug, info};

use super::{OrganizeReport, Organizer};
use crate::cancel::CancelToken;
use crate::oracle;
use crate::planner::Planner;
use crate::prompt::ClassificationRequest;
use crate::Result;

impl Organizer {
    pub(super) async fn run_intent(
        &self,
        directory: &Path,
        files: &[String],
        report: &mut OrganizeReport,
        cancel: &CancelToken,
    ) -> Result<()> {
        let rules = &self.config.rules;
        let mut planner = Planner::new(directory, rules);

        for (index, name) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancel_with(directory, &files[index..]);
                return Ok(());
            }

            let category = self.classify_intent(&directory.join(name), cancel).await?;

            // The in-flight call was killed; this file was never classified.
            if cancel.is_cancelled() {
                report.cancel_with(directory, &files[index..]);
                return Ok(());
            }

            info!("{} -> {}", name, category);
            let label = format!("{}{}", rules.intent_prefix, category);
            if let Some(planned) = planner.place(name, Some(&label)) {
                self.apply(planned, report);
            }
        }

        Ok(())
    }

    /// Intent category of one file, or the configured fallback
    async fn classify_intent(&self, path: &Path, cancel: &CancelToken) -> Result<String> {
        let unknown = &self.config.rules.unknown_intent;

        let sample = self.sampler.extract_leading_text(path);
        if sample.is_empty() {
            debug!("No readable content in {:?}", path);
            return Ok(unknown.clone());
        }

        let prompt = self.prompts.render(&ClassificationRequest::intent(path, sample))?;
        let result = oracle::invoke(self.oracle.as_ref(), &prompt, cancel).await;
        if !result.succeeded {
            return Ok(unknown.clone());
        }

        Ok(intent_category(&result.raw_text).unwrap_or_else(|| unknown.clone()))
    }
}

/// Clean a reply down to a folder-friendly category.
///
/// Takes the first non-empty line, drops a leading `Category:`, wrapping
/// quotes, backticks or bold markers and a trailing period, and joins words
/// with `_`.
pub fn intent_category(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;

    let line = match line.split_once(':') {
        Some((head, rest)) if head.trim().eq_ignore_ascii_case("category") => rest.trim(),
        _ => line,
    };

    let mut text = line;
    loop {
        let before = text;
        for wrapper in ["**", "`", "\"", "'"] {
            if text.len() >= 2 * wrapper.len() && text.starts_with(wrapper) && text.ends_with(wrapper) {
                text = text[wrapper.len()..text.len() - wrapper.len()].trim();
            }
        }
        text = text.trim_end_matches('.').trim_end();
        if text == before {
            break;
        }
    }

    let category = text.split_whitespace().collect::<Vec<_>>().join("_");
    if category.is_empty() {
        None
    } else {
        Some(category)
    }
}

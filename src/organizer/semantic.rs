// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Semantic strategy: one oracle call groups the whole directory by name

use std::path::Path;
use tracing::{info, warn};

use super::{OrganizeReport, Organizer};
use crate::cancel::CancelToken;
use crate::oracle;
use crate::parser;
use crate::planner;
use crate::prompt::ClassificationRequest;
use crate::Result;

impl Organizer {
    pub(super) async fn run_semantic(
        &self,
        directory: &Path,
        files: &[String],
        report: &mut OrganizeReport,
        cancel: &CancelToken,
    ) -> Result<()> {
        let prompt = self
            .prompts
            .render(&ClassificationRequest::semantic(files.to_vec()))?;

        let result = oracle::invoke(self.oracle.as_ref(), &prompt, cancel).await;
        if cancel.is_cancelled() {
            report.cancel_with(directory, files);
            return Ok(());
        }

        let text = if result.succeeded {
            result.raw_text
        } else {
            warn!(
                "No grouping from the oracle ({:?}); everything goes to {}",
                result.failure_kind, self.config.rules.misc_folder
            );
            String::new()
        };

        let assignment = parser::parse(&text, files);
        info!(
            "Oracle grouped {} of {} files ({} left at root, {} unmatched)",
            assignment.categorized().count(),
            assignment.len(),
            assignment.root().count(),
            assignment.unmatched().count()
        );

        let plan = planner::plan(&assignment, directory, &self.config.rules);
        self.execute_plan(plan, report, cancel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::cancel::CancelToken;
    use crate::config::AppConfig;
    use crate::oracle::{FailureKind, ScriptedOracle};
    use crate::organizer::{Organizer, Strategy};
    use std::fs;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_call_for_whole_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["shot_1.png", "shot_2.png", "todo.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let oracle = Arc::new(ScriptedOracle::replying(
            "shot_1.png -> Screenshots\nshot_2.png -> Screenshots\ntodo.txt -> (root)",
        ));
        let organizer = Organizer::with_oracle(AppConfig::default(), oracle.clone()).unwrap();

        let report = organizer
            .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(oracle.calls(), 1);
        assert!(oracle.prompts()[0].contains("shot_1.png, shot_2.png, todo.txt"));
        assert_eq!(report.moves.len(), 3);
        assert!(dir.path().join("Screenshots").join("shot_2.png").is_file());
        assert!(dir.path().join("Miscellaneous").join("todo.txt").is_file());
    }

    #[tokio::test]
    async fn test_oracle_failure_routes_to_misc() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let oracle = Arc::new(ScriptedOracle::failing(FailureKind::Timeout));
        let organizer = Organizer::with_oracle(AppConfig::default(), oracle).unwrap();

        let report = organizer
            .run(Strategy::Semantic, dir.path(), false, &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(report.moves.len(), 2);
        assert!(dir.path().join("Miscellaneous").join("a.txt").is_file());
        assert!(dir.path().join("Miscellaneous").join("b.txt").is_file());
    }
}

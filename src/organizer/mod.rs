// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Organize runs: snapshot a directory, classify, plan and move
//!
//! A run is sequential and single-writer. Only setup problems (the target is
//! not a directory, it cannot be listed, a template does not render) surface
//! as errors; everything per-file is logged and recorded in the report.

pub mod extension;
pub mod intent;
pub mod semantic;
pub mod timeline;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::AppConfig;
use crate::mover::move_file;
use crate::oracle::{self, TextOracle};
use crate::planner::{MovePlan, PlannedMove};
use crate::prompt::PromptBuilder;
use crate::sampler::SamplerRegistry;
use crate::{CorralError, Result};

/// Suffixes of files that are still being written
const TEMP_SUFFIXES: &[&str] = &[".tmp", ".part", ".crdownload", ".partial", ".download"];

/// OS bookkeeping files that never get organized
const SYSTEM_FILES: &[&str] = &["desktop.ini", "thumbs.db", ".ds_store"];

/// How files are grouped into folders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// By file extension, using the configured category table
    Extension,
    /// By creation month
    Timeline,
    /// By filename similarity, one oracle call for the whole directory
    Semantic,
    /// By what the content asks the reader to do, one oracle call per file
    Intent,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extension => "extension",
            Self::Timeline => "timeline",
            Self::Semantic => "semantic",
            Self::Intent => "intent",
        }
    }

    pub fn uses_oracle(&self) -> bool {
        matches!(self, Self::Semantic | Self::Intent)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct OrganizeReport {
    pub strategy: Strategy,
    pub directory: PathBuf,
    /// Files in the snapshot
    pub scanned: usize,
    /// Moves performed, or only planned when `dry_run` is set
    pub moves: Vec<PlannedMove>,
    /// Sources whose move failed; they are still where they were
    pub failed: Vec<PathBuf>,
    /// Sources deliberately not moved
    pub left_in_place: Vec<PathBuf>,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl OrganizeReport {
    fn new(strategy: Strategy, directory: &Path, dry_run: bool) -> Self {
        Self {
            strategy,
            directory: directory.to_path_buf(),
            scanned: 0,
            moves: Vec::new(),
            failed: Vec::new(),
            left_in_place: Vec::new(),
            dry_run,
            cancelled: false,
        }
    }

    /// Mark the run cancelled, leaving `remaining` where they are
    fn cancel_with<'a>(&mut self, directory: &Path, remaining: impl IntoIterator<Item = &'a String>) {
        info!("Run cancelled");
        self.cancelled = true;
        self.left_in_place
            .extend(remaining.into_iter().map(|name| directory.join(name)));
    }
}

/// Runs organize strategies over directories
pub struct Organizer {
    config: AppConfig,
    sampler: SamplerRegistry,
    prompts: PromptBuilder,
    oracle: Arc<dyn TextOracle>,
    ignore: Vec<glob::Pattern>,
}

impl Organizer {
    /// Build an organizer with the oracle selected by `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        let oracle = oracle::from_config(&config.oracle)?;
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: AppConfig, oracle: Arc<dyn TextOracle>) -> Result<Self> {
        config.validate()?;

        let ignore = config
            .rules
            .ignore_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            sampler: SamplerRegistry::new(&config.sampler),
            prompts: PromptBuilder::new(&config.prompts)?,
            oracle,
            ignore,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn oracle(&self) -> &dyn TextOracle {
        self.oracle.as_ref()
    }

    /// Organize the regular files directly inside `directory`
    pub async fn run(
        &self,
        strategy: Strategy,
        directory: &Path,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> Result<OrganizeReport> {
        let files = self.snapshot_files(directory)?;
        info!(
            "Organizing {:?} by {} ({} files{})",
            directory,
            strategy,
            files.len(),
            if dry_run { ", dry run" } else { "" }
        );

        let mut report = OrganizeReport::new(strategy, directory, dry_run);
        report.scanned = files.len();

        if files.is_empty() {
            info!("Nothing to organize in {:?}", directory);
            return Ok(report);
        }

        match strategy {
            Strategy::Extension => self.run_extension(directory, &files, &mut report, cancel),
            Strategy::Timeline => self.run_timeline(directory, &files, &mut report, cancel),
            Strategy::Semantic => self.run_semantic(directory, &files, &mut report, cancel).await?,
            Strategy::Intent => self.run_intent(directory, &files, &mut report, cancel).await?,
        }

        info!(
            "Finished {} run: {} moved, {} failed, {} left in place",
            strategy,
            report.moves.len(),
            report.failed.len(),
            report.left_in_place.len()
        );
        Ok(report)
    }

    /// Sorted names of the regular files directly inside `directory`
    pub fn snapshot_files(&self, directory: &Path) -> Result<Vec<String>> {
        if !directory.is_dir() {
            return Err(CorralError::NotADirectory(directory.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 filename: {:?}", path);
                continue;
            };

            if self.should_process(&name) {
                files.push(name);
            } else {
                debug!("Skipping {}", name);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Whether a top-level file takes part in a run
    pub fn should_process(&self, filename: &str) -> bool {
        if filename.starts_with('.') && !self.config.rules.include_hidden {
            return false;
        }

        let lower = filename.to_lowercase();
        if TEMP_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return false;
        }

        if SYSTEM_FILES.iter().any(|n| lower == *n) {
            return false;
        }

        !self.ignore.iter().any(|p| p.matches(filename))
    }

    /// Carry out a whole plan, stopping early on cancellation
    fn execute_plan(&self, plan: MovePlan, report: &mut OrganizeReport, cancel: &CancelToken) {
        let mut moves = plan.into_iter();

        while let Some(planned) = moves.next() {
            if cancel.is_cancelled() {
                info!("Run cancelled");
                report.cancelled = true;
                report.left_in_place.push(planned.source);
                report.left_in_place.extend(moves.map(|m| m.source));
                return;
            }
            self.apply(planned, report);
        }
    }

    /// Perform (or, in a dry run, only record) one move
    fn apply(&self, planned: PlannedMove, report: &mut OrganizeReport) {
        if report.dry_run {
            info!("Would move: {:?} -> {:?}", planned.source, planned.destination());
            report.moves.push(planned);
            return;
        }

        if move_file(
            &planned.source,
            &planned.destination_folder,
            Some(&planned.destination_filename),
        ) {
            report.moves.push(planned);
        } else {
            report.failed.push(planned.source);
        }
    }
}

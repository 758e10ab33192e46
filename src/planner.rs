// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Turn category assignments into collision-free moves
//!
//! Nothing here touches the filesystem except to look at what already
//! exists. A planned destination is never an existing path and never a path
//! claimed by an earlier entry of the same plan.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::RuleConfig;
use crate::parser::{ParsedAssignment, Placement};
use crate::sampler::truncate_chars;

/// One move, not yet executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination_folder: PathBuf,
    pub destination_filename: String,
}

impl PlannedMove {
    pub fn destination(&self) -> PathBuf {
        self.destination_folder.join(&self.destination_filename)
    }
}

/// Ordered list of planned moves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MovePlan {
    pub moves: Vec<PlannedMove>,
}

impl MovePlan {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedMove> {
        self.moves.iter()
    }
}

impl IntoIterator for MovePlan {
    type Item = PlannedMove;
    type IntoIter = std::vec::IntoIter<PlannedMove>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

/// Incremental planner for one run over one directory
pub struct Planner {
    directory: PathBuf,
    misc_folder: String,
    max_label_length: usize,
    sources: HashSet<PathBuf>,
    claimed: HashSet<PathBuf>,
    moves: Vec<PlannedMove>,
}

impl Planner {
    pub fn new(directory: &Path, rules: &RuleConfig) -> Self {
        let misc_folder = sanitize_label(&rules.misc_folder, rules.max_label_length)
            .unwrap_or_else(|| "Miscellaneous".to_string());
        let misc_folder = unblocked_folder(directory, misc_folder);

        Self {
            directory: directory.to_path_buf(),
            misc_folder,
            max_label_length: rules.max_label_length,
            sources: HashSet::new(),
            claimed: HashSet::new(),
            moves: Vec::new(),
        }
    }

    /// Plan moving `filename` (directly inside the directory) into the folder
    /// for `label`, or the miscellaneous folder when `label` is `None` or
    /// unusable. Returns `None` if the file was already planned.
    pub fn place(&mut self, filename: &str, label: Option<&str>) -> Option<PlannedMove> {
        let source = self.directory.join(filename);
        if !self.sources.insert(source.clone()) {
            warn!("{} is already planned; ignoring second placement", filename);
            return None;
        }

        let folder_name = self.folder_for(label);
        let destination_folder = self.directory.join(&folder_name);
        let destination_filename = resolve_collision(&destination_folder, filename, &self.claimed);

        if destination_filename != filename {
            debug!("{} exists in {}; using {}", filename, folder_name, destination_filename);
        }

        self.claimed.insert(destination_folder.join(&destination_filename));

        let planned = PlannedMove {
            source,
            destination_folder,
            destination_filename,
        };
        self.moves.push(planned.clone());
        Some(planned)
    }

    pub fn finish(self) -> MovePlan {
        MovePlan { moves: self.moves }
    }

    fn folder_for(&self, label: Option<&str>) -> String {
        let Some(raw) = label else {
            return self.misc_folder.clone();
        };

        let Some(folder) = sanitize_label(raw, self.max_label_length) else {
            warn!("Category {:?} is not usable as a folder name; using {}", raw, self.misc_folder);
            return self.misc_folder.clone();
        };

        // A plain file already sits where the folder would go.
        let path = self.directory.join(&folder);
        if path.symlink_metadata().is_ok() && !path.is_dir() {
            warn!("{:?} exists and is not a directory; using {}", path, self.misc_folder);
            return self.misc_folder.clone();
        }

        folder
    }
}

/// `name`, or the first `name_N` that no plain file in `directory` blocks
fn unblocked_folder(directory: &Path, name: String) -> String {
    let blocked = |candidate: &str| {
        let path = directory.join(candidate);
        path.symlink_metadata().is_ok() && !path.is_dir()
    };

    if !blocked(&name) {
        return name;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{}_{}", name, counter);
        if !blocked(&candidate) {
            warn!("{:?} is a file; using {} as the miscellaneous folder", directory.join(&name), candidate);
            return candidate;
        }
        counter += 1;
    }
}

/// Plan every file of an assignment, in assignment order
pub fn plan(assignment: &ParsedAssignment, directory: &Path, rules: &RuleConfig) -> MovePlan {
    let mut planner = Planner::new(directory, rules);

    for (filename, placement) in assignment.entries() {
        match placement {
            Placement::Categorized(label) => planner.place(filename, Some(label)),
            Placement::Root | Placement::Unmatched => planner.place(filename, None),
        };
    }

    planner.finish()
}

/// Make a category label safe to use as a single folder name.
///
/// Path separators, Windows-reserved characters and control characters
/// become `_`, whitespace runs (tabs and newlines included) collapse to one
/// space, leading/trailing dots and spaces are
/// removed and the result is cut to `max_len` characters. `None` when
/// nothing usable is left.
pub fn sanitize_label(raw: &str, max_len: usize) -> Option<String> {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_whitespace() => ' ',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let is_edge = |c: char| c == '.' || c == ' ';
    let trimmed = collapsed.trim_matches(is_edge);
    let label = truncate_chars(trimmed, max_len).trim_end_matches(is_edge);

    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// First of `name`, `stem_1.ext`, `stem_2.ext`, … that neither exists in
/// `folder` nor is already claimed
pub fn resolve_collision(folder: &Path, filename: &str, claimed: &HashSet<PathBuf>) -> String {
    let taken = |name: &str| {
        let path = folder.join(name);
        claimed.contains(&path) || path.symlink_metadata().is_ok()
    };

    if !taken(filename) {
        return filename.to_string();
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, extension);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

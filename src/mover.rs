// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Execute a single planned move
//!
//! Moves never overwrite. Every failure is logged and reported as `false`
//! so one bad file cannot abort the rest of a run.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Move `source` into `dest_folder`, creating the folder if needed.
///
/// The destination keeps the source's filename unless `dest_filename` is
/// given. Returns `true` only when the file now lives at the destination
/// and no longer at the source.
pub fn move_file(source: &Path, dest_folder: &Path, dest_filename: Option<&str>) -> bool {
    let filename = match dest_filename {
        Some(name) => name.to_string(),
        None => match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                warn!("Cannot move {:?}: no filename", source);
                return false;
            }
        },
    };

    if !source.is_file() {
        warn!("Cannot move {:?}: source is missing or not a regular file", source);
        return false;
    }

    if let Err(e) = fs::create_dir_all(dest_folder) {
        warn!("Cannot create {:?}: {}", dest_folder, e);
        return false;
    }

    let destination = dest_folder.join(&filename);
    if destination.symlink_metadata().is_ok() {
        warn!("Refusing to overwrite {:?}", destination);
        return false;
    }

    match relocate(source, &destination) {
        Ok(()) => {
            info!("Moved: {:?} -> {:?}", source, destination);
            true
        }
        Err(e) => {
            warn!("Failed to move {:?} -> {:?}: {}", source, destination, e);
            false
        }
    }
}

/// Rename, falling back to copy + remove across filesystems
fn relocate(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!("rename failed ({}), copying instead", rename_err);
            fs::copy(source, destination)?;

            if let Err(e) = fs::remove_file(source) {
                // Leave exactly one copy behind.
                let _ = fs::remove_file(destination);
                return Err(e);
            }
            Ok(())
        }
    }
}

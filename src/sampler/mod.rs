// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Content sampling: a bounded leading excerpt of a file's text
//!
//! Readers are looked up by extension in a [`SamplerRegistry`]. Anything the
//! registry does not know, and any reader failure, yields an empty string.

pub mod document;
pub mod pdf;
pub mod spreadsheet;

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::Result;

/// Trait for leading-text readers
pub trait ContentReader: Send + Sync {
    /// Name of this reader
    fn name(&self) -> &'static str;

    /// File extensions (lowercase, no dot) this reader handles
    fn supported_extensions(&self) -> &[&str];

    /// Read the leading excerpt of a file
    fn read_leading(&self, path: &Path, limits: &SamplerConfig) -> Result<String>;
}

/// Extension -> reader table
pub struct SamplerRegistry {
    readers: Vec<Box<dyn ContentReader>>,
    by_extension: HashMap<String, usize>,
    limits: SamplerConfig,
}

impl SamplerRegistry {
    /// Create a registry with the built-in readers
    pub fn new(limits: &SamplerConfig) -> Self {
        let mut registry = Self::empty(limits);

        registry.register(Box::new(pdf::PdfReader::new()));
        registry.register(Box::new(document::DocxReader::new()));
        registry.register(Box::new(document::TextReader::new()));
        registry.register(Box::new(spreadsheet::SpreadsheetReader::new()));

        registry
    }

    /// Create a registry with no readers; every file samples as empty
    pub fn empty(limits: &SamplerConfig) -> Self {
        Self {
            readers: Vec::new(),
            by_extension: HashMap::new(),
            limits: limits.clone(),
        }
    }

    /// Register a reader; it takes over any extension already claimed
    pub fn register(&mut self, reader: Box<dyn ContentReader>) {
        let index = self.readers.len();
        for ext in reader.supported_extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), index);
        }
        self.readers.push(reader);
    }

    /// Find the reader for a file
    pub fn find_reader(&self, path: &Path) -> Option<&dyn ContentReader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_extension
            .get(&ext)
            .map(|&i| self.readers[i].as_ref())
    }

    /// Get reader names
    pub fn reader_names(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.name()).collect()
    }

    /// Leading text of `path`, or an empty string if it cannot be read
    pub fn extract_leading_text(&self, path: &Path) -> String {
        let reader = match self.find_reader(path) {
            Some(r) => r,
            None => {
                debug!("No reader for: {:?}", path);
                return String::new();
            }
        };

        match reader.read_leading(path, &self.limits) {
            Ok(text) => truncate_chars(text.trim(), self.limits.max_chars).to_string(),
            Err(e) => {
                warn!("{} reader failed on {:?}: {}", reader.name(), path, e);
                String::new()
            }
        }
    }
}

/// Cut `text` to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

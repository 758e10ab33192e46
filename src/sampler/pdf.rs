// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PDF first-page reader

use std::path::Path;
use tracing::debug;

use super::ContentReader;
use crate::config::SamplerConfig;
use crate::{CorralError, Result};

/// Text of the first page of a PDF
pub struct PdfReader;

impl PdfReader {
    pub fn new() -> Self {
        Self
    }

    /// Extract the first page with lopdf
    fn first_page(bytes: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| CorralError::Pdf(format!("Failed to load PDF: {}", e)))?;

        let first = doc
            .get_pages()
            .keys()
            .next()
            .copied()
            .ok_or_else(|| CorralError::Pdf("PDF has no pages".to_string()))?;

        doc.extract_text(&[first])
            .map_err(|e| CorralError::Pdf(format!("Text extraction failed: {}", e)))
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for PdfReader {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn read_leading(&self, path: &Path, _limits: &SamplerConfig) -> Result<String> {
        let bytes = std::fs::read(path)?;

        let text = Self::first_page(&bytes)?;
        if text.trim().is_empty() {
            debug!("First page of {:?} has no text layer", path);
        }
        Ok(text)
    }
}

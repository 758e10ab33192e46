// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Spreadsheet reader: leading rows of the first sheet

use calamine::{open_workbook_auto, Reader};
use std::path::Path;

use super::ContentReader;
use crate::config::SamplerConfig;
use crate::{CorralError, Result};

pub struct SpreadsheetReader;

impl SpreadsheetReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpreadsheetReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for SpreadsheetReader {
    fn name(&self) -> &'static str {
        "spreadsheet"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx", "xlsm", "xls", "ods"]
    }

    fn read_leading(&self, path: &Path, limits: &SamplerConfig) -> Result<String> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| CorralError::Document(format!("Failed to open spreadsheet: {}", e)))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut text = format!("Sheets: {}\n", sheet_names.join(", "));

        if let Some(sheet_name) = sheet_names.first() {
            let range = workbook
                .worksheet_range(sheet_name)
                .map_err(|e| CorralError::Document(format!("Failed to read sheet {}: {}", sheet_name, e)))?;

            for row in range.rows().take(limits.spreadsheet_rows) {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                text.push_str(&cells.join("\t"));
                text.push('\n');
            }
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.xlsx");
        std::fs::write(&path, "nope").unwrap();

        let result = SpreadsheetReader::new().read_leading(&path, &SamplerConfig::default());
        assert!(matches!(result, Err(CorralError::Document(_))));
    }
}

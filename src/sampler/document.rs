// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Readers for word-processor documents and plain text

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

use super::ContentReader;
use crate::config::SamplerConfig;
use crate::{CorralError, Result};

/// First paragraphs of a DOCX file
pub struct DocxReader;

impl DocxReader {
    pub fn new() -> Self {
        Self
    }

    /// Pull `word/document.xml` out of the package
    fn document_xml(path: &Path) -> Result<String> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| CorralError::Document(format!("Failed to open DOCX: {}", e)))?;

        let mut document_xml = archive
            .by_name("word/document.xml")
            .map_err(|_| CorralError::Document("No document.xml found".to_string()))?;

        let mut content = String::new();
        document_xml.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Text of the first `limit` `<w:p>` paragraphs, empty ones included
    fn paragraphs(xml: &str, limit: usize) -> Result<Vec<String>> {
        let mut reader = Reader::from_str(xml);
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut in_paragraph = false;
        let mut in_text = false;

        while paragraphs.len() < limit {
            let event = reader
                .read_event()
                .map_err(|e| CorralError::Document(format!("Malformed document.xml: {}", e)))?;

            match event {
                Event::Start(e) => match e.name().as_ref() {
                    b"w:p" => {
                        in_paragraph = true;
                        current.clear();
                    }
                    b"w:t" => in_text = true,
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"w:p" => paragraphs.push(String::new()),
                    b"w:tab" if in_paragraph => current.push('\t'),
                    b"w:br" if in_paragraph => current.push('\n'),
                    _ => {}
                },
                Event::Text(t) if in_text => {
                    let text = t
                        .unescape()
                        .map_err(|e| CorralError::Document(format!("Bad text run: {}", e)))?;
                    current.push_str(&text);
                }
                Event::End(e) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" => {
                        in_paragraph = false;
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(paragraphs)
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for DocxReader {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn read_leading(&self, path: &Path, limits: &SamplerConfig) -> Result<String> {
        let xml = Self::document_xml(path)?;
        Ok(Self::paragraphs(&xml, limits.docx_paragraphs)?.join("\n"))
    }
}

/// First bytes of a UTF-8 text file
pub struct TextReader;

impl TextReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode a prefix that may end in the middle of a character
    fn decode_prefix(bytes: &[u8]) -> Result<String> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            // Cut mid-character by the byte limit: keep the valid part.
            Err(e) if e.error_len().is_none() => {
                Ok(String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned())
            }
            Err(e) => Err(CorralError::Document(format!("Not valid UTF-8: {}", e))),
        }
    }
}

impl Default for TextReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for TextReader {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown", "rst", "log", "csv", "json", "yaml", "yml", "toml"]
    }

    fn read_leading(&self, path: &Path, limits: &SamplerConfig) -> Result<String> {
        let file = std::fs::File::open(path)?;
        let mut buf = Vec::with_capacity(limits.text_bytes);
        file.take(limits.text_bytes as u64).read_to_end(&mut buf)?;
        Self::decode_prefix(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_docx(path: &Path, body: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        zip.finish().unwrap();
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
    }

    #[test]
    fn test_docx_first_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        let body: String = (1..=12).map(|i| para(&format!("Paragraph {}", i))).collect();
        write_docx(&path, &body);

        let text = DocxReader::new().read_leading(&path, &SamplerConfig::default()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "Paragraph 1");
        assert_eq!(lines[9], "Paragraph 10");
    }

    #[test]
    fn test_docx_runs_and_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.docx");
        let body = r#"<w:p><w:r><w:t>Terms &amp; </w:t></w:r><w:r><w:t>Conditions</w:t></w:r></w:p><w:p/>"#;
        write_docx(&path, body);

        let text = DocxReader::new().read_leading(&path, &SamplerConfig::default()).unwrap();
        assert_eq!(text, "Terms & Conditions\n");
    }

    #[test]
    fn test_docx_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, "plain text").unwrap();

        assert!(DocxReader::new().read_leading(&path, &SamplerConfig::default()).is_err());
    }

    #[test]
    fn test_text_reads_byte_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        std::fs::write(&path, "x".repeat(5000)).unwrap();

        let text = TextReader::new().read_leading(&path, &SamplerConfig::default()).unwrap();
        assert_eq!(text.len(), 2048);
    }

    #[test]
    fn test_text_cut_mid_character() {
        // 'é' is two bytes; a 3-byte limit lands inside the second one.
        let decoded = TextReader::decode_prefix("éé".as_bytes().get(..3).unwrap()).unwrap();
        assert_eq!(decoded, "é");
    }

    #[test]
    fn test_text_rejects_binary() {
        assert!(TextReader::decode_prefix(&[0x66, 0xFF, 0xFE, 0x66]).is_err());
    }

    #[test]
    fn test_text_strips_bom() {
        assert_eq!(TextReader::decode_prefix(b"\xEF\xBB\xBFhello").unwrap(), "hello");
    }
}

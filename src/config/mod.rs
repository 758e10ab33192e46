// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Corral

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Oracle (text generation) settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Category label -> lowercase extensions (with the leading dot)
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<String, Vec<String>>,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Placement rules
    #[serde(default)]
    pub rules: RuleConfig,

    /// Content sampling limits
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// Which transport reaches the oracle
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    /// Spawn `<command> <args...> <model> <prompt>` once per call
    Process,
    /// POST to the Ollama HTTP API
    Http,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OracleConfig {
    #[serde(default = "default_backend")]
    pub backend: OracleBackend,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_command_args")]
    pub args: Vec<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    /// Rendered with `filenames` (comma separated) and `count`
    #[serde(default = "default_semantic_prompt")]
    pub semantic: String,
    /// Rendered with `content` and `filename`
    #[serde(default = "default_intent_prompt")]
    pub intent: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RuleConfig {
    #[serde(default = "default_misc_folder")]
    pub misc_folder: String,
    #[serde(default = "default_unknown_intent")]
    pub unknown_intent: String,
    #[serde(default = "default_intent_prefix")]
    pub intent_prefix: String,
    #[serde(default = "default_unknown_date")]
    pub unknown_date: String,
    #[serde(default = "default_max_label_length")]
    pub max_label_length: usize,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_text_bytes")]
    pub text_bytes: usize,
    #[serde(default = "default_docx_paragraphs")]
    pub docx_paragraphs: usize,
    #[serde(default = "default_spreadsheet_rows")]
    pub spreadsheet_rows: usize,
    /// Hard cap on any excerpt handed to a prompt
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

// Default value functions
fn default_backend() -> OracleBackend { OracleBackend::Process }
fn default_command() -> String { "ollama".to_string() }
fn default_command_args() -> Vec<String> { vec!["run".to_string()] }
fn default_model() -> String { "gemma3:4b".to_string() }
fn default_url() -> String { "http://localhost:11434".to_string() }
fn default_timeout() -> u64 { 300 }
fn default_misc_folder() -> String { "Miscellaneous".to_string() }
fn default_unknown_intent() -> String { "Unknown_Intent".to_string() }
fn default_intent_prefix() -> String { "Intent_".to_string() }
fn default_unknown_date() -> String { "Unknown_Date".to_string() }
fn default_max_label_length() -> usize { 64 }
fn default_text_bytes() -> usize { 2048 }
fn default_docx_paragraphs() -> usize { 10 }
fn default_spreadsheet_rows() -> usize { 20 }
fn default_max_chars() -> usize { 4000 }

fn default_categories() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 8] = [
        ("documents", &[".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt"]),
        ("images", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"]),
        ("audio", &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a"]),
        ("video", &[".mp4", ".avi", ".mov", ".mkv", ".wmv", ".flv", ".webm"]),
        ("archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
        ("code", &[".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".php", ".rs"]),
        ("spreadsheets", &[".xlsx", ".xls", ".csv", ".ods"]),
        ("presentations", &[".pptx", ".ppt", ".odp", ".key"]),
    ];

    table
        .into_iter()
        .map(|(label, exts)| {
            (label.to_string(), exts.iter().map(|e| e.to_string()).collect())
        })
        .collect()
}

fn default_semantic_prompt() -> String {
    "You sort files into folders using nothing but their names. Look at the \
     filenames below and group the ones that clearly belong together.\n\n\
     Rules:\n\
     1. Give every group a short, descriptive folder name (two or three words).\n\
     2. Base the name on what the files have in common, e.g. the shared part of \
        a series of screenshots.\n\
     3. Never use placeholder names such as 'Group 1' or 'Category A'.\n\
     4. A file that fits no group gets (root) as its folder; it will be placed \
        in a Miscellaneous folder.\n\n\
     Example:\n\
     invoice_march.pdf -> Invoices\n\
     invoice_april.pdf -> Invoices\n\
     screenshot_profile_2024.png -> Profile Screenshots\n\
     resume_v2.docx -> Resume Documents\n\
     random_file.txt -> (root)\n\n\
     Answer with exactly one line per file in the form:\n\
     <filename> -> <folder name>\n\n\
     Filenames ({{ count }}):\n\
     {{ filenames }}\n"
        .to_string()
}

fn default_intent_prompt() -> String {
    "You decide what should happen next with a document, based on its content.\n\n\
     Pick the single best action category from: To_Read, To_Sign, To_Review, \
     To_Complete, To_Reply, To_File, Reference. If none fits, invent a short \
     action-oriented category of at most three words.\n\
     Reply with the category name only.\n\n\
     Document ({{ filename }}):\n\
     {{ content }}\n\n\
     Category:"
        .to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            categories: default_categories(),
            prompts: PromptConfig::default(),
            rules: RuleConfig::default(),
            sampler: SamplerConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            command: default_command(),
            args: default_command_args(),
            model: default_model(),
            url: default_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            semantic: default_semantic_prompt(),
            intent: default_intent_prompt(),
        }
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            misc_folder: default_misc_folder(),
            unknown_intent: default_unknown_intent(),
            intent_prefix: default_intent_prefix(),
            unknown_date: default_unknown_date(),
            max_label_length: default_max_label_length(),
            include_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            text_bytes: default_text_bytes(),
            docx_paragraphs: default_docx_paragraphs(),
            spreadsheet_rows: default_spreadsheet_rows(),
            max_chars: default_max_chars(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::CorralError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        use crate::CorralError::Config;

        if self.oracle.timeout_secs == 0 {
            return Err(Config("oracle.timeout_secs must be greater than zero".to_string()));
        }
        if self.oracle.model.trim().is_empty() {
            return Err(Config("oracle.model must not be empty".to_string()));
        }
        if self.oracle.backend == OracleBackend::Process && self.oracle.command.trim().is_empty() {
            return Err(Config("oracle.command must not be empty".to_string()));
        }
        if self.rules.max_label_length == 0 {
            return Err(Config("rules.max_label_length must be greater than zero".to_string()));
        }

        let fixed = [
            ("rules.misc_folder", &self.rules.misc_folder),
            ("rules.unknown_intent", &self.rules.unknown_intent),
            ("rules.unknown_date", &self.rules.unknown_date),
        ];
        for (key, label) in fixed {
            if crate::planner::sanitize_label(label, self.rules.max_label_length).is_none() {
                return Err(Config(format!("{} is not usable as a folder name: {:?}", key, label)));
            }
        }

        for (label, extensions) in &self.categories {
            if let Some(bad) = extensions.iter().find(|e| !e.starts_with('.')) {
                return Err(Config(format!(
                    "categories.{}: extension {:?} must include the leading dot",
                    label, bad
                )));
            }
        }

        for pattern in &self.rules.ignore_patterns {
            glob::Pattern::new(pattern)?;
        }

        Ok(())
    }
}

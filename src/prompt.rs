// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Classification requests and prompt rendering

use minijinja::{context, Environment, UndefinedBehavior};
use std::path::{Path, PathBuf};

use crate::config::PromptConfig;
use crate::Result;

/// Input for one oracle call, built fresh for each run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationRequest {
    /// One file, classified by what its content asks the reader to do
    Intent { file_path: PathBuf, sampled_text: String },
    /// A whole directory, grouped by filename
    Semantic { file_list: Vec<String> },
}

impl ClassificationRequest {
    pub fn intent(file_path: &Path, sampled_text: impl Into<String>) -> Self {
        Self::Intent {
            file_path: file_path.to_path_buf(),
            sampled_text: sampled_text.into(),
        }
    }

    pub fn semantic(file_list: Vec<String>) -> Self {
        Self::Semantic { file_list }
    }
}

/// Renders the configured templates
pub struct PromptBuilder {
    env: Environment<'static>,
    semantic: String,
    intent: String,
}

impl PromptBuilder {
    /// Compile-check both templates up front so a typo fails at startup
    pub fn new(prompts: &PromptConfig) -> Result<Self> {
        {
            let env = Environment::new();
            env.template_from_str(&prompts.semantic)?;
            env.template_from_str(&prompts.intent)?;
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        Ok(Self {
            env,
            semantic: prompts.semantic.clone(),
            intent: prompts.intent.clone(),
        })
    }

    pub fn render(&self, request: &ClassificationRequest) -> Result<String> {
        let prompt = match request {
            ClassificationRequest::Semantic { file_list } => self.env.render_str(
                &self.semantic,
                context! {
                    filenames => file_list.join(", "),
                    count => file_list.len(),
                },
            )?,
            ClassificationRequest::Intent { file_path, sampled_text } => {
                let filename = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.env.render_str(
                    &self.intent,
                    context! {
                        filename => filename,
                        content => sampled_text,
                    },
                )?
            }
        };

        Ok(prompt)
    }
}

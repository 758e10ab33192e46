// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Deterministic oracle for tests and offline dry runs

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::{normalize_reply, FailureKind, OracleError, TextOracle};
use crate::cancel::CancelToken;

/// What the scripted oracle answers
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(FailureKind),
}

/// Answers prompts from a fixed script and records every prompt it saw.
///
/// Rules are checked in insertion order; the first whose needle occurs in the
/// prompt wins, otherwise the fallback reply is used.
#[derive(Debug)]
pub struct ScriptedOracle {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    /// Answer every prompt with the same text
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_fallback(Reply::Text(text.into()))
    }

    /// Fail every prompt the same way
    pub fn failing(kind: FailureKind) -> Self {
        Self::with_fallback(Reply::Fail(kind))
    }

    pub fn with_fallback(fallback: Reply) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Use `reply` for prompts containing `needle`
    pub fn when_prompt_contains(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Number of prompts received
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Every prompt received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn reply_for(&self, prompt: &str) -> &Reply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback)
    }
}

fn error_for(kind: FailureKind) -> OracleError {
    match kind {
        FailureKind::Timeout => OracleError::Timeout(Duration::ZERO),
        FailureKind::ProcessError => OracleError::Process("scripted failure".to_string()),
        FailureKind::EmptyResponse => OracleError::EmptyResponse,
        FailureKind::Cancelled => OracleError::Cancelled,
    }
}

#[async_trait]
impl TextOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<String, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }

        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        match self.reply_for(prompt) {
            Reply::Text(text) => normalize_reply(text),
            Reply::Fail(kind) => Err(error_for(*kind)),
        }
    }
}

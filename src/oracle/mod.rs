// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Text-generation oracle
//!
//! The oracle is whatever answers a classification prompt with free text.
//! It is treated as untrusted: every failure is normalized into an
//! [`OracleResult`] with `succeeded == false` and an empty text, so callers
//! never have to handle a fault from this layer.

pub mod ollama;
pub mod process;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::config::{OracleBackend, OracleConfig};
use crate::Result;

pub use ollama::OllamaClient;
pub use process::ProcessOracle;
pub use scripted::{Reply, ScriptedOracle};

/// Why an oracle call produced no usable text
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle process failed: {0}")]
    Process(String),

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("oracle call cancelled")]
    Cancelled,
}

/// Coarse failure classification carried by [`OracleResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ProcessError,
    EmptyResponse,
    Cancelled,
}

impl OracleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Process(_) => FailureKind::ProcessError,
            Self::EmptyResponse => FailureKind::EmptyResponse,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Outcome of one oracle call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleResult {
    /// Stripped reply; empty whenever `succeeded` is false
    pub raw_text: String,
    pub succeeded: bool,
    pub failure_kind: Option<FailureKind>,
}

impl OracleResult {
    pub fn success(text: String) -> Self {
        Self {
            raw_text: text,
            succeeded: true,
            failure_kind: None,
        }
    }

    pub fn failure(kind: FailureKind) -> Self {
        Self {
            raw_text: String::new(),
            succeeded: false,
            failure_kind: Some(kind),
        }
    }
}

/// Something that turns a prompt into generated text
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Run one independent generation. Implementations must not leak the
    /// underlying process or connection when `cancel` fires or time runs out.
    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> std::result::Result<String, OracleError>;
}

/// Call the oracle and fold every failure into a well-formed result
pub async fn invoke(oracle: &dyn TextOracle, prompt: &str, cancel: &CancelToken) -> OracleResult {
    if prompt.trim().is_empty() {
        warn!("Refusing to send an empty prompt to {}", oracle.name());
        return OracleResult::failure(FailureKind::ProcessError);
    }

    debug!("Invoking oracle {} ({} chars)", oracle.name(), prompt.len());

    match oracle.generate(prompt, cancel).await {
        Ok(text) => OracleResult::success(text),
        Err(e) => {
            warn!("Oracle {} failed: {}", oracle.name(), e);
            OracleResult::failure(e.kind())
        }
    }
}

/// Strip a raw reply, rejecting whitespace-only output
pub(crate) fn normalize_reply(raw: &str) -> std::result::Result<String, OracleError> {
    let text = raw.trim();
    if text.is_empty() {
        Err(OracleError::EmptyResponse)
    } else {
        Ok(text.to_string())
    }
}

/// Build the oracle selected by configuration
pub fn from_config(config: &OracleConfig) -> Result<Arc<dyn TextOracle>> {
    let oracle: Arc<dyn TextOracle> = match config.backend {
        OracleBackend::Process => Arc::new(ProcessOracle::new(config)),
        OracleBackend::Http => Arc::new(OllamaClient::new(config)?),
    };
    Ok(oracle)
}

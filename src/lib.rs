// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Corral: local-oracle file organizer
//!
//! Sorts the files of a directory into subfolders by extension, creation
//! month, filename similarity or document intent. The last two ask a local
//! language model (an `ollama` process or its HTTP API) and turn its free-text
//! answer into safe, collision-free moves.

pub mod cancel;
pub mod config;
pub mod error;
pub mod mover;
pub mod oracle;
pub mod organizer;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod sampler;

pub use cancel::CancelToken;
pub use config::AppConfig;
pub use error::{CorralError, Result};
pub use organizer::{OrganizeReport, Organizer, Strategy};

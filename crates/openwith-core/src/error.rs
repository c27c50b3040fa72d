// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for OpenWith.

use thiserror::Error;

/// Top-level error type for all OpenWith operations.
#[derive(Debug, Error)]
pub enum OpenWithError {
    // -- Command surface --
    #[error("invalid arguments for `{action}`: {reason}")]
    InvalidAction { action: String, reason: String },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    // -- Content access --
    #[error("content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl OpenWithError {
    /// Shorthand for an argument validation failure on `action`.
    pub fn invalid_action(action: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OpenWithError>;

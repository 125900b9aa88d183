//! Effect Module
//!
//! Effect scripts are opaque to the host: they are handed to the engine
//! verbatim and only the engine decides whether they are valid. This module
//! holds the script type and the compiler used by the headless engine.

mod compiler;
mod lexer;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use compiler::{CompiledEffect, EffectCompiler, Expr, Timeline};

/// Effect source text in the engine's effect language
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectScript(String);

impl EffectScript {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank script means "no effect"
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for EffectScript {
    fn from(source: String) -> Self {
        Self(source)
    }
}

impl From<&str> for EffectScript {
    fn from(source: &str) -> Self {
        Self(source.to_string())
    }
}

impl fmt::Display for EffectScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compilation error with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at byte {offset}")]
pub struct EffectError {
    pub message: String,
    pub offset: usize,
}

impl EffectError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

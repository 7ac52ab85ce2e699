//! The two externally visible failure kinds, plus the fault channel for
//! host-native callables.

use std::fmt;

use thiserror::Error;

/// An execution failure from the runtime core. These terminate the script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A parse failure reported by the external parser. When it arises from an
/// `include`, the runtime re-raises it with an `Included from "URL"` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParserError {
    pub message: String,
    /// Source text of the offending line.
    pub line: String,
    pub line_number: u32,
    pub column_number: u32,
    pub prefix: Option<String>,
}

impl ParserError {
    pub fn new(
        message: impl Into<String>,
        line: impl Into<String>,
        line_number: u32,
        column_number: u32,
    ) -> Self {
        Self {
            message: message.into(),
            line: line.into(),
            line_number,
            column_number,
            prefix: None,
        }
    }

    /// Annotate the error with its originating include URL.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, "{}: ", prefix)?;
        }
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.line_number, self.column_number
        )
    }
}

/// Umbrella error returned by the public entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

/// Fault channel for host-native callables.
///
/// `Runtime` propagates out of the script unchanged; any other host failure
/// is contained at the call site: logged through `log_fn` and replaced by a
/// null call result.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl CallError {
    /// Shorthand for a contained host fault.
    pub fn host(message: impl Into<String>) -> Self {
        CallError::Host(anyhow::anyhow!(message.into()))
    }
}

//! Error types for the conversion pipeline.
//!
//! Malformed HTML is never an error: the lexer and parser recover locally.
//! The only failures that surface are engine invariant violations and an
//! unrecognized clipboard header.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Engine invariant violation (bug/corruption), not a recoverable HTML error.
pub struct EngineInvariantError {
    pub context: &'static str,
}

impl EngineInvariantError {
    pub(crate) const fn new(context: &'static str) -> Self {
        Self { context }
    }
}

impl fmt::Display for EngineInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine invariant violated: {}", self.context)
    }
}

impl std::error::Error for EngineInvariantError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvertError {
    Invariant(EngineInvariantError),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Invariant(err) => write!(f, "conversion aborted: {err}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Invariant(err) => Some(err),
        }
    }
}

impl From<EngineInvariantError> for ConvertError {
    fn from(err: EngineInvariantError) -> Self {
        ConvertError::Invariant(err)
    }
}

/// Text reported in place of a payload when a clipboard header cannot be read.
pub const UNRECOGNIZED_HEADER: &str = "ERROR: Unrecognized html header";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardHeaderError {
    MissingStartHtml,
    MissingEndHtml,
    MissingStartFragment,
    MissingEndFragment,
    BadOffset,
    OffsetOutOfRange,
}

impl fmt::Display for ClipboardHeaderError {
    // Every variant renders as the same sentinel; the variant is for callers
    // that want to tell the cases apart.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(UNRECOGNIZED_HEADER)
    }
}

impl std::error::Error for ClipboardHeaderError {}

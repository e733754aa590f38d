//! Errors raised while reading, writing and editing CHEMKIN reaction blocks.
//!
//! Every error that concerns a single reaction names it by its canonical
//! equation string (see `ReactionId`'s `Display`), so a failure in a mechanism
//! of several thousand reactions can be traced back to the offending entry.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChemkinError {
    #[error("Malformed number '{0}'")]
    MalformedNumber(String),
    /// a slash-keyword line is present but can not be interpreted
    #[error("Unknown or malformed keyword line '{line}' in reaction {reaction}")]
    UnknownKeyword { line: String, reaction: String },
    #[error("Malformed equation line '{line}': {reason}")]
    MalformedEquation { line: String, reason: String },
    #[error("Reaction {reaction}: TROE parameters given without a LOW line")]
    InconsistentTroe { reaction: String },
    #[error("Reaction {reaction}: more than one primary rate form ({first} and {second})")]
    ConflictingForms {
        reaction: String,
        first: String,
        second: String,
    },
    #[error(
        "Reaction {reaction}: Chebyshev expansion needs {expected} coefficients, found {found}"
    )]
    ChebyshevCoeffMismatch {
        reaction: String,
        expected: usize,
        found: usize,
    },
    #[error("Unknown units '{0}'")]
    UnknownUnits(String),
    #[error("Reaction {reaction}: {form} expression requires a third body")]
    MissingThirdBody { reaction: String, form: String },
    #[error("Keyword line '{0}' found before any reaction equation")]
    OrphanContinuation(String),
    #[error("Reaction {reaction}: non-finite rate parameter")]
    BadFit { reaction: String },
    #[error("Raw entry of reaction {reaction} does not match the block being edited")]
    StaleRawText { reaction: String },
    #[error("Section '{0}' not found in mechanism")]
    MissingSection(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

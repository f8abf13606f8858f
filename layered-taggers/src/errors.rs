//! Error types for taggers.

use layered_text::LayerError;
use thiserror::Error;

/// Errors raised while building or attaching a tagger's layer.
#[derive(Debug, Error)]
pub enum TaggerError {
    /// The input text lacks a layer the tagger reads, or the output could not be
    /// attached.
    #[error(transparent)]
    Layer(#[from] LayerError),

    /// An external process (parser, temporal tagger) failed.
    #[error("{process} failed: {message}")]
    External { process: &'static str, message: String },

    /// A line of parser output that is not a CoNLL token line.
    #[error("malformed CoNLL line {line}: {message}")]
    Conll { line: usize, message: String },

    /// Unrecognized return type selection.
    #[error("unknown return type {0:?} (expected \"text\" or \"conll\")")]
    UnknownReturnType(String),

    /// A document creation date that is neither `YYYY-MM-DD` nor `YYYY-MM-DDTHH:MM`.
    #[error("unexpected creation date {0:?}")]
    CreationDate(String),

    /// A lexicon could not be parsed.
    #[error("invalid lexicon: {0}")]
    Lexicon(String),
}

/// Result type for tagger operations.
pub type TaggerResult<T> = Result<T, TaggerError>;

//! Error types for vocabulary loading.

use std::path::PathBuf;

use layered_text::GrammarError;
use thiserror::Error;

/// Errors raised while loading a vocabulary or building symbols from it.
#[derive(Debug, Error)]
pub enum VocabularyError {
    /// The source holds no records.
    #[error("empty vocabulary")]
    Empty,

    /// A column declares a type other than `string`, `regex` or `expr`.
    #[error("unexpected type {tag:?} for column {column:?}")]
    UnknownColumnType { column: String, tag: String },

    /// A record lacks the key attribute.
    #[error("record {record} has no value for key {key:?}")]
    MissingKey { record: usize, key: String },

    /// A `regex` column value failed to compile.
    #[error("invalid pattern {value:?} in column {column:?}: {source}")]
    Pattern {
        column: String,
        value: String,
        #[source]
        source: regex::Error,
    },

    /// An `expr` column value is not a valid expression.
    #[error("invalid expression {value:?} in column {column:?}: {message}")]
    Expr {
        column: String,
        value: String,
        message: String,
    },

    /// A value that cannot be read as text, such as a table or an array.
    #[error("column {column:?} of record {record} must be a scalar")]
    NotScalar { column: String, record: usize },

    /// A symbol was requested from a column that is not a `regex` column.
    #[error("column {0:?} is not a regex column")]
    NotARegexColumn(String),

    /// The vocabulary file could not be parsed.
    #[error("failed to parse vocabulary: {0}")]
    Toml(#[from] toml::de::Error),

    /// The vocabulary file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Building a grammar symbol failed.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Result type for vocabulary operations.
pub type VocabularyResult<T> = Result<T, VocabularyError>;

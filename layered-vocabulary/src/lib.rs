#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Vocabularies for layered-text grammars.
//!
//! A vocabulary maps a key attribute to one or more records of typed columns. Columns
//! are `string` (kept verbatim), `regex` (compiled) or `expr` (read as a RON value).
//! Vocabularies are loaded from TOML and turned into grammar terminals.
//!
//! ## Modules
//!
//! - [`vocabulary`] - Loading and lookup
//! - [`symbols`] - Terminal symbols built from keys and pattern columns
//! - [`errors`] - Error types for loading

pub mod errors;
pub mod symbols;
pub mod vocabulary;

pub use errors::{VocabularyError, VocabularyResult};
pub use vocabulary::{ColumnType, RawRecord, VocabRecord, VocabValue, Vocabulary};

#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Layered text annotation with a positional grammar engine.
//!
//! A [`Text`] is enriched step by step with named [`Layer`]s of spans: tokens,
//! sentences, morphological readings. A [`Grammar`](grammar::Grammar) derives new
//! layers from existing ones by combining spans with positional operators
//! (adjacency, gaps, union), then keeps the best non-overlapping matches.
//!
//! ## Modules
//!
//! - [`span`] - Spans, ambiguous spans and enveloping spans
//! - [`span_ops`] - Positional relations between two spans
//! - [`layer`] - Schema-checked span collections
//! - [`text`] - The per-document layer registry
//! - [`grammar`] - Symbols, evaluation, conflict resolution and projection
//! - [`display`] - Plain-text rendering of layers for tests and debugging
//!
//! ```
//! use layered_text::grammar::Grammar;
//! use layered_text::{AnnotateConfig, Text};
//!
//! let mut grammar = Grammar::new();
//! let number = grammar.pattern(r"\d+", None).unwrap();
//! let word = grammar.pattern(r"[a-z]+", None).unwrap();
//! let space = grammar.pattern(r" ", None).unwrap();
//! let amount = grammar.concatenation(&[number, space, word], Some("amount")).unwrap();
//!
//! let mut text = Text::new("buy 12 eggs");
//! grammar.annotate(amount, &mut text, &AnnotateConfig::default()).unwrap();
//! assert_eq!(text.span_texts("amount").unwrap(), vec!["12 eggs"]);
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod grammar;
pub mod layer;
pub mod names;
pub mod span;
pub mod span_ops;
pub mod text;
pub mod value;


pub use config::AnnotateConfig;
pub use display::TextDisplay;
pub use error::{GrammarError, GrammarResult, LayerError, LayerResult};
pub use layer::{Layer, LayerSpan, SpanBase, SpanRecord};
pub use span::{AmbiguousSpan, Bounded, EnvelopingSpan, Span};
pub use text::Text;
pub use value::{Annotation, Value};

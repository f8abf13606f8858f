//! Error types for layer attachment and grammar evaluation.

use thiserror::Error;

use crate::span::Span;

/// Contract violations on [`Text`](crate::Text) and [`Layer`](crate::Layer) mutation.
///
/// A rejected operation leaves the text and the layer unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Layer or attribute name is not an identifier, or is reserved.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A layer with this name is already attached.
    #[error("layer {0:?} is already attached")]
    Duplicate(String),

    /// No layer with this name is attached.
    #[error("unknown layer {0:?}")]
    UnknownLayer(String),

    /// The declared parent or enveloping target is not attached.
    #[error("layer {layer:?} depends on {target:?}, which is not attached")]
    MissingDependency { layer: String, target: String },

    /// A layer declared both a parent and an enveloping target.
    #[error("layer {0:?} cannot have both a parent and an enveloping target")]
    ParentAndEnveloping(String),

    /// The layer is a dependency of other attached layers.
    #[error("layer {layer:?} is in use by {dependents:?}")]
    InUse { layer: String, dependents: Vec<String> },

    /// Span offsets are out of range or split a character of the raw text.
    #[error("span {span} of layer {layer:?} does not fit the text")]
    OutOfBounds { layer: String, span: Span },

    /// A second record for an existing boundary in a non-ambiguous layer.
    #[error("layer {layer:?} is not ambiguous, but already has a span at {span}")]
    DuplicateSpan { layer: String, span: Span },

    /// A span without any annotation record.
    #[error("span {span} of layer {layer:?} carries no annotation record")]
    MissingAnnotation { layer: String, span: Span },

    /// A record carries an attribute the layer does not declare.
    #[error("layer {layer:?} has no attribute {attribute:?}")]
    UnknownAttribute { layer: String, attribute: String },

    /// A span of a child layer has no counterpart in its parent layer.
    #[error("span {span} of layer {layer:?} has no counterpart in parent {parent:?}")]
    Orphan { layer: String, parent: String, span: Span },

    /// Enveloping span children are empty, unordered or out of range.
    #[error("malformed enveloping span {span} in layer {layer:?}")]
    MalformedEnvelope { layer: String, span: Span },

    /// The kind of span added does not match the layer's kind.
    #[error("layer {layer:?} expects {expected} spans")]
    WrongSpanKind { layer: String, expected: &'static str },

    /// Serialized layers could not be read or written.
    #[error("layer serialization failed: {0}")]
    Serialization(String),
}

/// Result type for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;

/// Errors raised while building or evaluating a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// Malformed pattern text for a pattern terminal.
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Symbol names become layer names and must be valid identifiers.
    #[error("invalid symbol name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A combinator was given no children.
    #[error("{0} needs at least one child symbol")]
    EmptyCombinator(&'static str),

    /// A symbol id that does not belong to this grammar.
    #[error("symbol #{0} is not defined in this grammar")]
    UnknownSymbol(usize),

    /// A terminal refers to a layer the text does not carry.
    #[error("layer {0:?} is required by the grammar but not attached")]
    MissingLayer(String),

    /// Unrecognized conflict resolver selection.
    #[error("unknown conflict resolver {0:?} (expected \"maximal_coverage\" or \"keep_all\")")]
    UnknownResolver(String),

    /// Projecting matches back onto the text failed.
    #[error(transparent)]
    Layer(#[from] LayerError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for grammar operations.
pub type GrammarResult<T> = Result<T, GrammarError>;

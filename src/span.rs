//! Span primitives.
//!
//! A [`Span`] is a half-open byte interval `[start, end)` into the raw text of a
//! [`Text`](crate::Text). Layers store spans together with their annotation records
//! ([`AmbiguousSpan`]) or as references to the spans of a base layer
//! ([`EnvelopingSpan`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Annotation;

/// Anything with a start and an end offset.
///
/// The relational predicates in [`span_ops`](crate::span_ops) are defined over this
/// trait so that spans, layer spans and grammar matches can be compared directly.
pub trait Bounded {
    fn start(&self) -> usize;
    fn end(&self) -> usize;

    /// `(start, end)`, the ordering key shared by every bounded type.
    fn bounds(&self) -> (usize, usize) {
        (self.start(), self.end())
    }

    /// Span length, used as the match weight during conflict resolution.
    fn len(&self) -> usize {
        self.end() - self.start()
    }

    fn is_empty(&self) -> bool {
        self.start() == self.end()
    }
}

/// An immutable offset interval into the raw text.
///
/// Ordering is lexicographic on `(start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// Returns `None` when `start > end`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Create a span from already ordered offsets, swapping them if needed.
    pub fn ordered(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// The covered slice of `source`, or `None` if the span is out of range or
    /// splits a character.
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl Bounded for Span {
    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

impl<T: Bounded + ?Sized> Bounded for &T {
    fn start(&self) -> usize {
        (**self).start()
    }

    fn end(&self) -> usize {
        (**self).end()
    }
}

/// A span boundary carrying an unordered bag of annotation records.
///
/// All records share the boundary. A non-ambiguous layer stores exactly one record
/// per span; an ambiguous layer may store several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousSpan {
    span: Span,
    annotations: Vec<Annotation>,
}

impl AmbiguousSpan {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(span: Span, annotation: Annotation) -> Self {
        Self {
            span,
            annotations: vec![annotation],
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Add a record to the bag. Records equal to one already present are ignored.
    ///
    /// Returns whether the record was added.
    pub(crate) fn push(&mut self, annotation: Annotation) -> bool {
        if self.annotations.contains(&annotation) {
            return false;
        }
        self.annotations.push(annotation);
        true
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut [Annotation] {
        &mut self.annotations
    }

    /// Records present in only one of the two bags: `(only in self, only in other)`.
    pub fn symmetric_difference<'a>(
        &'a self,
        other: &'a AmbiguousSpan,
    ) -> (Vec<&'a Annotation>, Vec<&'a Annotation>) {
        let only_self = self
            .annotations
            .iter()
            .filter(|a| !other.annotations.contains(a))
            .collect();
        let only_other = other
            .annotations
            .iter()
            .filter(|a| !self.annotations.contains(a))
            .collect();
        (only_self, only_other)
    }

    /// Same boundary and no record present in only one of the bags.
    pub fn same_annotations(&self, other: &AmbiguousSpan) -> bool {
        if self.span != other.span {
            return false;
        }
        let (a, b) = self.symmetric_difference(other);
        a.is_empty() && b.is_empty()
    }
}

impl Bounded for AmbiguousSpan {
    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

/// An ordered run of spans of a base layer, referenced by position.
///
/// The boundary is `(first_child.start, last_child.end)`. Children are indices into
/// the base layer's span list and must be ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvelopingSpan {
    span: Span,
    children: Vec<usize>,
}

impl EnvelopingSpan {
    /// Build an enveloping span over `base_spans[i]` for each `i` in `children`.
    ///
    /// Returns `None` when `children` is empty, not strictly ascending, or out of
    /// range for `base_spans`.
    pub fn from_indices(base_spans: &[Span], children: Vec<usize>) -> Option<Self> {
        let first = *children.first()?;
        let last = *children.last()?;
        if children.windows(2).any(|w| w[0] >= w[1]) || last >= base_spans.len() {
            return None;
        }
        let span = Span::new(base_spans[first].start, base_spans[last].end)?;
        Some(Self { span, children })
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Positions of the enveloped spans in the base layer.
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

impl Bounded for EnvelopingSpan {
    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}

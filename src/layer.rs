//! Layers: named, schema-checked, ordered collections of spans.
//!
//! A [`Layer`] is built detached, then attached to a [`Text`](crate::Text), which
//! validates it against the raw text and resolves its references into the parent or
//! base layer. Attached layers are frozen; replacing one goes through
//! [`Text::set_layer`](crate::Text::set_layer).

use serde::{Deserialize, Serialize};

use crate::error::{LayerError, LayerResult};
use crate::span::{AmbiguousSpan, Bounded, EnvelopingSpan, Span};
use crate::value::{Annotation, Value};

/// How a layer span relates to other layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanBase {
    /// A span on the raw text, or a child span not yet bound to its parent.
    Free,
    /// Position of the corresponding span in the parent layer.
    Parent(usize),
    /// Positions of the enveloped spans in the base layer.
    Enveloping(Vec<usize>),
}

/// One span of a layer with its annotation records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpan {
    span: AmbiguousSpan,
    base: SpanBase,
}

impl LayerSpan {
    pub fn span(&self) -> Span {
        self.span.span()
    }

    /// All records at this boundary. Non-ambiguous layers hold exactly one.
    pub fn annotations(&self) -> &[Annotation] {
        self.span.annotations()
    }

    /// The first record, which is the only one in a non-ambiguous layer.
    pub fn annotation(&self) -> Option<&Annotation> {
        self.span.annotations().first()
    }

    pub fn as_ambiguous(&self) -> &AmbiguousSpan {
        &self.span
    }

    pub fn base(&self) -> &SpanBase {
        &self.base
    }

    pub fn parent_index(&self) -> Option<usize> {
        match self.base {
            SpanBase::Parent(i) => Some(i),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[usize]> {
        match &self.base {
            SpanBase::Enveloping(children) => Some(children),
            _ => None,
        }
    }

    /// Values of `attribute` across all records at this boundary.
    pub fn values<'a, 'b>(&'a self, attribute: &'b str) -> impl Iterator<Item = &'a Value> + 'b
    where
        'a: 'b,
    {
        self.annotations().iter().filter_map(move |a| a.get(attribute))
    }

    /// Same support: equal enveloped children for enveloping spans, equal boundaries
    /// otherwise.
    pub fn equal_support(&self, other: &LayerSpan) -> bool {
        match (&self.base, &other.base) {
            (SpanBase::Enveloping(a), SpanBase::Enveloping(b)) => a == b,
            (SpanBase::Enveloping(_), _) | (_, SpanBase::Enveloping(_)) => false,
            _ => self.span() == other.span(),
        }
    }

    pub(crate) fn set_base(&mut self, base: SpanBase) {
        self.base = base;
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut [Annotation] {
        self.span.annotations_mut()
    }
}

impl Bounded for LayerSpan {
    fn start(&self) -> usize {
        self.span.start()
    }

    fn end(&self) -> usize {
        self.span.end()
    }
}

/// A plain record form of a layer span, used to round-trip layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub start: usize,
    pub end: usize,
    /// Enveloped base-layer positions, for enveloping layers only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<usize>>,
    pub annotations: Vec<Annotation>,
}

/// A named layer of spans.
///
/// ```
/// use layered_text::{Annotation, Layer, Span, Text};
///
/// let mut text = Text::new("Kui mitu kuud");
/// let mut words = Layer::new("words").with_attributes(["lemma"]);
/// words.add_span(Span::new(0, 3).unwrap(), Annotation::new().with("lemma", "kui")).unwrap();
/// words.add_span(Span::new(4, 8).unwrap(), Annotation::new().with("lemma", "mitu")).unwrap();
/// text.add_layer(words).unwrap();
///
/// assert_eq!(text.span_texts("words").unwrap(), vec!["Kui", "mitu"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    name: String,
    attributes: Vec<String>,
    ambiguous: bool,
    parent: Option<String>,
    enveloping: Option<String>,
    spans: Vec<LayerSpan>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            ambiguous: false,
            parent: None,
            enveloping: None,
            spans: Vec::new(),
        }
    }

    /// Declare the attribute schema. Repeated names are kept once, in first-seen order.
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for attribute in attributes {
            let attribute = attribute.into();
            if !self.attributes.contains(&attribute) {
                self.attributes.push(attribute);
            }
        }
        self
    }

    pub fn ambiguous(mut self) -> Self {
        self.ambiguous = true;
        self
    }

    /// Make every span of this layer correspond to a span of `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Make this layer's spans envelop runs of spans of `base`.
    pub fn enveloping(mut self, base: impl Into<String>) -> Self {
        self.enveloping = Some(base.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn enveloping_target(&self) -> Option<&str> {
        self.enveloping.as_deref()
    }

    /// The layer this one depends on, whether as parent or as enveloping base.
    pub fn dependency(&self) -> Option<&str> {
        self.parent().or_else(|| self.enveloping_target())
    }

    pub fn spans(&self) -> &[LayerSpan] {
        &self.spans
    }

    pub fn get(&self, index: usize) -> Option<&LayerSpan> {
        self.spans.get(index)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayerSpan> {
        self.spans.iter()
    }

    /// Boundaries of all spans, ascending.
    pub fn span_list(&self) -> Vec<Span> {
        self.spans.iter().map(LayerSpan::span).collect()
    }

    /// Position of the span with exactly this boundary.
    pub fn position(&self, span: Span) -> Option<usize> {
        self.spans
            .binary_search_by_key(&span.bounds(), |s| s.bounds())
            .ok()
    }

    /// Add a span with one annotation record.
    ///
    /// In an ambiguous layer a second record at an existing boundary joins that
    /// span's bag; in a non-ambiguous layer it is rejected.
    pub fn add_span(&mut self, span: Span, annotation: Annotation) -> LayerResult<()> {
        if self.enveloping.is_some() {
            return Err(LayerError::WrongSpanKind {
                layer: self.name.clone(),
                expected: "enveloping",
            });
        }
        self.insert(span, SpanBase::Free, annotation)
    }

    /// Add an enveloping span with one annotation record.
    pub fn add_enveloping_span(
        &mut self,
        envelope: EnvelopingSpan,
        annotation: Annotation,
    ) -> LayerResult<()> {
        if self.enveloping.is_none() {
            return Err(LayerError::WrongSpanKind {
                layer: self.name.clone(),
                expected: "plain",
            });
        }
        let span = envelope.span();
        let children = envelope.children().to_vec();
        if let Some(existing) = self.position(span) {
            if self.spans[existing].children() != Some(children.as_slice()) {
                return Err(LayerError::DuplicateSpan {
                    layer: self.name.clone(),
                    span,
                });
            }
        }
        self.insert(span, SpanBase::Enveloping(children), annotation)
    }

    fn insert(&mut self, span: Span, base: SpanBase, mut annotation: Annotation) -> LayerResult<()> {
        annotation
            .conform(&self.attributes)
            .map_err(|attribute| LayerError::UnknownAttribute {
                layer: self.name.clone(),
                attribute,
            })?;

        match self
            .spans
            .binary_search_by_key(&span.bounds(), |s| s.bounds())
        {
            Ok(existing) => {
                if !self.ambiguous {
                    return Err(LayerError::DuplicateSpan {
                        layer: self.name.clone(),
                        span,
                    });
                }
                self.spans[existing].span.push(annotation);
            }
            Err(position) => {
                self.spans.insert(
                    position,
                    LayerSpan {
                        span: AmbiguousSpan::with_annotation(span, annotation),
                        base,
                    },
                );
            }
        }
        Ok(())
    }

    /// Plain records of every span, in span order.
    pub fn to_records(&self) -> Vec<SpanRecord> {
        self.spans
            .iter()
            .map(|s| SpanRecord {
                start: s.start(),
                end: s.end(),
                children: s.children().map(<[usize]>::to_vec),
                annotations: s.annotations().to_vec(),
            })
            .collect()
    }

    /// Add spans from plain records.
    ///
    /// Enveloping records must carry their children; their boundaries are checked
    /// against the base layer on attachment.
    pub fn extend_records<I>(&mut self, records: I) -> LayerResult<()>
    where
        I: IntoIterator<Item = SpanRecord>,
    {
        for record in records {
            let span = Span::new(record.start, record.end).ok_or_else(|| {
                LayerError::OutOfBounds {
                    layer: self.name.clone(),
                    span: Span::ordered(record.start, record.end),
                }
            })?;
            let base = match (record.children, self.enveloping.is_some()) {
                (Some(children), true) => SpanBase::Enveloping(children),
                (None, false) => SpanBase::Free,
                (_, enveloping) => {
                    return Err(LayerError::WrongSpanKind {
                        layer: self.name.clone(),
                        expected: if enveloping { "enveloping" } else { "plain" },
                    })
                }
            };
            for annotation in record.annotations {
                self.insert(span, base.clone(), annotation)?;
            }
        }
        Ok(())
    }

    pub(crate) fn spans_mut(&mut self) -> &mut Vec<LayerSpan> {
        &mut self.spans
    }
}

impl<'a> IntoIterator for &'a Layer {
    type Item = &'a LayerSpan;
    type IntoIter = std::slice::Iter<'a, LayerSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize) -> Span {
        Span::new(start, end).unwrap()
    }

    fn lemma(value: &str) -> Annotation {
        Annotation::new().with("lemma", value)
    }

    #[test]
    fn insertion_keeps_spans_sorted() {
        let mut layer = Layer::new("test");
        for (start, end) in [(1, 2), (2, 3), (0, 1), (3, 4)].iter() {
            layer.add_span(span(*start, *end), Annotation::new()).unwrap();
        }
        assert_eq!(
            layer.span_list(),
            vec![span(0, 1), span(1, 2), span(2, 3), span(3, 4)]
        );
        assert_eq!(layer.position(span(2, 3)), Some(2));
        assert_eq!(layer.position(span(2, 4)), None);
    }

    #[test]
    fn non_ambiguous_layer_rejects_shared_boundary() {
        let mut layer = Layer::new("words").with_attributes(["lemma"]);
        layer.add_span(span(0, 3), lemma("kui")).unwrap();
        let err = layer.add_span(span(0, 3), lemma("KUU")).unwrap_err();
        assert_eq!(
            err,
            LayerError::DuplicateSpan {
                layer: "words".into(),
                span: span(0, 3)
            }
        );
        // overlapping but distinct boundaries are fine
        layer.add_span(span(0, 2), lemma("ku")).unwrap();
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn ambiguous_layer_collects_records() {
        let mut layer = Layer::new("words").with_attributes(["lemma"]).ambiguous();
        layer.add_span(span(0, 3), lemma("kui")).unwrap();
        layer.add_span(span(0, 3), lemma("KUU")).unwrap();
        layer.add_span(span(4, 8), lemma("mitu")).unwrap();

        assert_eq!(layer.len(), 2);
        let values: Vec<_> = layer.spans()[0].values("lemma").collect();
        assert_eq!(values, vec![&Value::from("kui"), &Value::from("KUU")]);
    }

    #[test]
    fn records_are_checked_against_schema() {
        let mut layer = Layer::new("words").with_attributes(["lemma", "form"]);
        layer.add_span(span(0, 3), lemma("kui")).unwrap();
        assert_eq!(
            layer.spans()[0].annotation().unwrap().get("form"),
            Some(&Value::Null)
        );

        let err = layer
            .add_span(span(4, 8), Annotation::new().with("case", "n"))
            .unwrap_err();
        assert!(matches!(err, LayerError::UnknownAttribute { attribute, .. } if attribute == "case"));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn span_kind_must_match_layer_kind() {
        let base = vec![span(0, 3), span(4, 8)];
        let envelope = EnvelopingSpan::from_indices(&base, vec![0, 1]).unwrap();

        let mut plain = Layer::new("plain");
        assert!(matches!(
            plain.add_enveloping_span(envelope.clone(), Annotation::new()),
            Err(LayerError::WrongSpanKind { .. })
        ));

        let mut pairs = Layer::new("pairs").enveloping("words");
        assert!(matches!(
            pairs.add_span(span(0, 8), Annotation::new()),
            Err(LayerError::WrongSpanKind { .. })
        ));
        pairs.add_enveloping_span(envelope, Annotation::new()).unwrap();
        assert_eq!(pairs.spans()[0].children(), Some(&[0, 1][..]));
    }

    #[test]
    fn records_round_trip() {
        let mut layer = Layer::new("words").with_attributes(["lemma"]).ambiguous();
        layer.add_span(span(0, 3), lemma("kui")).unwrap();
        layer.add_span(span(0, 3), lemma("KUU")).unwrap();
        layer.add_span(span(4, 8), lemma("mitu")).unwrap();

        let mut copy = Layer::new("words").with_attributes(["lemma"]).ambiguous();
        copy.extend_records(layer.to_records()).unwrap();
        assert_eq!(copy, layer);
    }

    #[test]
    fn equal_support_compares_children_of_envelopes() {
        let base = vec![span(0, 3), span(3, 5), span(5, 8)];
        let mut pairs = Layer::new("pairs").enveloping("words").ambiguous();
        pairs
            .add_enveloping_span(
                EnvelopingSpan::from_indices(&base, vec![0, 2]).unwrap(),
                Annotation::new(),
            )
            .unwrap();
        let mut triples = Layer::new("triples").enveloping("words");
        triples
            .add_enveloping_span(
                EnvelopingSpan::from_indices(&base, vec![0, 1, 2]).unwrap(),
                Annotation::new(),
            )
            .unwrap();

        let a = &pairs.spans()[0];
        let b = &triples.spans()[0];
        assert_eq!(a.span(), b.span());
        assert!(!a.equal_support(b));
        assert!(a.equal_support(a));
    }
}

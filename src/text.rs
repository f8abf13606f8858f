use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayerError, LayerResult};
use crate::layer::{Layer, LayerSpan, SpanBase};
use crate::names::check_identifier;
use crate::span::{Bounded, Span};
use crate::value::Value;

/// A raw text with its attached layers.
///
/// Layers are kept in attachment order, so a layer's parent or enveloping base always
/// precedes it. Attaching validates the layer against the text and the layers it
/// depends on; a rejected layer leaves the text unmodified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    text: String,
    layers: Vec<Layer>,
    index: HashMap<String, usize>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    text: &'a str,
    layers: &'a [Layer],
}

#[derive(Deserialize)]
struct Snapshot {
    text: String,
    layers: Vec<Layer>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            layers: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.index.get(name).map(|&i| &self.layers[i])
    }

    /// Like [`Text::layer`], but a missing layer is an error.
    pub fn get(&self, name: &str) -> LayerResult<&Layer> {
        self.layer(name)
            .ok_or_else(|| LayerError::UnknownLayer(name.to_string()))
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of attached layers, in attachment order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(Layer::name)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers naming `name` as their parent or enveloping base.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| l.dependency() == Some(name))
            .map(Layer::name)
            .collect()
    }

    /// Attach a new layer.
    pub fn add_layer(&mut self, mut layer: Layer) -> LayerResult<()> {
        if self.index.contains_key(layer.name()) {
            return Err(LayerError::Duplicate(layer.name().to_string()));
        }
        self.bind(&mut layer)?;
        debug!(layer = layer.name(), spans = layer.len(), "attached layer");
        self.index.insert(layer.name().to_string(), self.layers.len());
        self.layers.push(layer);
        Ok(())
    }

    /// Attach `layer`, replacing any layer of the same name.
    ///
    /// A layer other layers depend on cannot be replaced.
    pub fn set_layer(&mut self, mut layer: Layer) -> LayerResult<()> {
        if !self.index.contains_key(layer.name()) {
            return self.add_layer(layer);
        }
        self.ensure_replaceable(layer.name())?;
        self.bind(&mut layer)?;

        debug!(layer = layer.name(), spans = layer.len(), "replaced layer");
        let name = layer.name().to_string();
        self.layers.retain(|l| l.name() != name);
        self.layers.push(layer);
        self.reindex();
        Ok(())
    }

    /// Fail with [`LayerError::InUse`] if other layers depend on `name`.
    pub fn ensure_replaceable(&self, name: &str) -> LayerResult<()> {
        let dependents = self.dependents(name);
        if dependents.is_empty() {
            Ok(())
        } else {
            Err(LayerError::InUse {
                layer: name.to_string(),
                dependents: dependents.into_iter().map(str::to_string).collect(),
            })
        }
    }

    /// Detach a layer together with every layer depending on it, directly or not.
    ///
    /// Returns the removed names, `name` first.
    pub fn remove_layer(&mut self, name: &str) -> LayerResult<Vec<String>> {
        if !self.index.contains_key(name) {
            return Err(LayerError::UnknownLayer(name.to_string()));
        }

        let mut removed: Vec<String> = Vec::new();
        let mut doomed: HashSet<&str> = HashSet::new();
        doomed.insert(name);
        removed.push(name.to_string());
        for layer in &self.layers {
            match layer.dependency() {
                Some(dep) if doomed.contains(dep) => {
                    doomed.insert(layer.name());
                    removed.push(layer.name().to_string());
                }
                _ => {}
            }
        }

        self.layers.retain(|l| !removed.iter().any(|r| r == l.name()));
        self.reindex();
        debug!(layer = name, removed = removed.len(), "removed layer");
        Ok(removed)
    }

    fn reindex(&mut self) {
        self.index = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| (l.name().to_string(), i))
            .collect();
    }

    /// Validate `layer` against the text and bind its spans to their parent or base.
    fn bind(&self, layer: &mut Layer) -> LayerResult<()> {
        let name = layer.name().to_string();
        check_identifier(&name).map_err(|reason| LayerError::InvalidName {
            name: name.clone(),
            reason,
        })?;
        for attribute in layer.attributes() {
            check_identifier(attribute).map_err(|reason| LayerError::InvalidName {
                name: attribute.clone(),
                reason,
            })?;
        }
        if layer.parent().is_some() && layer.enveloping_target().is_some() {
            return Err(LayerError::ParentAndEnveloping(name));
        }

        let dependency = match layer.dependency() {
            Some(target) => match self.layer(target) {
                Some(dep) if target != name => Some(dep),
                _ => {
                    return Err(LayerError::MissingDependency {
                        layer: name,
                        target: target.to_string(),
                    })
                }
            },
            None => None,
        };
        let is_parent = layer.parent().is_some();
        let ambiguous = layer.is_ambiguous();
        let attributes = layer.attributes().to_vec();

        let spans = layer.spans_mut();
        spans.sort_by_key(|s| s.bounds());
        if let Some(pair) = spans.windows(2).find(|w| w[0].span() == w[1].span()) {
            return Err(LayerError::DuplicateSpan {
                layer: name,
                span: pair[0].span(),
            });
        }

        for layer_span in spans.iter_mut() {
            let span = layer_span.span();
            if span.text(&self.text).is_none() {
                return Err(LayerError::OutOfBounds { layer: name, span });
            }
            match layer_span.annotations().len() {
                0 => return Err(LayerError::MissingAnnotation { layer: name, span }),
                1 => {}
                _ if !ambiguous => return Err(LayerError::DuplicateSpan { layer: name, span }),
                _ => {}
            }
            for annotation in layer_span.annotations_mut() {
                annotation
                    .conform(&attributes)
                    .map_err(|attribute| LayerError::UnknownAttribute {
                        layer: name.clone(),
                        attribute,
                    })?;
            }

            let base = match dependency {
                Some(parent) if is_parent => {
                    if layer_span.children().is_some() {
                        return Err(LayerError::WrongSpanKind {
                            layer: name,
                            expected: "plain",
                        });
                    }
                    let index = parent.position(span).ok_or_else(|| LayerError::Orphan {
                        layer: name.clone(),
                        parent: parent.name().to_string(),
                        span,
                    })?;
                    SpanBase::Parent(index)
                }
                Some(base) => {
                    let children = layer_span.children().ok_or_else(|| {
                        LayerError::WrongSpanKind {
                            layer: name.clone(),
                            expected: "enveloping",
                        }
                    })?;
                    if !envelope_fits(children, base.spans(), span) {
                        return Err(LayerError::MalformedEnvelope { layer: name, span });
                    }
                    SpanBase::Enveloping(children.to_vec())
                }
                None => {
                    if layer_span.children().is_some() {
                        return Err(LayerError::WrongSpanKind {
                            layer: name,
                            expected: "plain",
                        });
                    }
                    SpanBase::Free
                }
            };
            layer_span.set_base(base);
        }
        Ok(())
    }

    /// Span boundaries of a layer, ascending.
    pub fn spans(&self, name: &str) -> LayerResult<Vec<Span>> {
        Ok(self.get(name)?.span_list())
    }

    /// The covered text of each span of a layer.
    pub fn span_texts(&self, name: &str) -> LayerResult<Vec<&str>> {
        Ok(self
            .get(name)?
            .iter()
            .map(|s| self.slice(s))
            .collect())
    }

    /// Values of one attribute, per span, across all records of that span.
    pub fn attribute_values(&self, name: &str, attribute: &str) -> LayerResult<Vec<Vec<&Value>>> {
        let layer = self.get(name)?;
        if !layer.attributes().iter().any(|a| a == attribute) {
            return Err(LayerError::UnknownAttribute {
                layer: name.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Ok(layer.iter().map(|s| s.values(attribute).collect()).collect())
    }

    /// For an enveloping layer, the texts of the enveloped base spans of each span.
    pub fn enveloped_texts(&self, name: &str) -> LayerResult<Vec<Vec<&str>>> {
        let layer = self.get(name)?;
        let base = match layer.enveloping_target() {
            Some(target) => self.get(target)?,
            None => {
                return Err(LayerError::WrongSpanKind {
                    layer: name.to_string(),
                    expected: "enveloping",
                })
            }
        };
        Ok(layer
            .iter()
            .map(|s| {
                s.children()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|&i| base.get(i))
                    .map(|child| self.slice(child))
                    .collect()
            })
            .collect())
    }

    /// The parent-layer span bound to span `index` of layer `name`.
    pub fn parent_span(&self, name: &str, index: usize) -> Option<&LayerSpan> {
        let layer = self.layer(name)?;
        let parent = self.layer(layer.parent()?)?;
        parent.get(layer.get(index)?.parent_index()?)
    }

    fn slice<B: Bounded>(&self, span: &B) -> &str {
        &self.text[span.start()..span.end()]
    }

    /// Serialize the text and all layers to RON.
    pub fn to_ron(&self) -> LayerResult<String> {
        let snapshot = SnapshotRef {
            text: &self.text,
            layers: &self.layers,
        };
        ron::ser::to_string_pretty(&snapshot, ron::ser::PrettyConfig::default())
            .map_err(|e| LayerError::Serialization(e.to_string()))
    }

    /// Read a text written by [`Text::to_ron`]. Every layer is validated again.
    pub fn from_ron(input: &str) -> LayerResult<Self> {
        let snapshot: Snapshot =
            ron::from_str(input).map_err(|e| LayerError::Serialization(e.to_string()))?;
        let mut text = Text::new(snapshot.text);
        for layer in snapshot.layers {
            text.add_layer(layer)?;
        }
        Ok(text)
    }
}

fn envelope_fits(children: &[usize], base: &[LayerSpan], span: Span) -> bool {
    let (first, last) = match (children.first(), children.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return false,
    };
    last < base.len()
        && children.windows(2).all(|w| w[0] < w[1])
        && base[first].start() == span.start()
        && base[last].end() == span.end()
}

//! Writing resolved matches back onto a [`Text`] as layers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::matches::Match;
use super::symbol::{Grammar, SymbolId};
use crate::config::AnnotateConfig;
use crate::error::{GrammarResult, LayerError};
use crate::layer::Layer;
use crate::names::check_identifier;
use crate::span::Span;
use crate::text::Text;
use crate::value::Annotation;

impl Grammar {
    /// Evaluate `root`, resolve conflicts and project the survivors onto `text`.
    ///
    /// Running it again with the same grammar and configuration rewrites identical
    /// layers. Returns the names of the layers written.
    pub fn annotate(
        &self,
        root: SymbolId,
        text: &mut Text,
        config: &AnnotateConfig,
    ) -> GrammarResult<Vec<String>> {
        let matches = self.get_matches(root, text, config.resolver.resolver())?;
        project(text, &matches, config)
    }
}

/// Group matches by name and attach one layer per group, replacing older ones.
///
/// Unnamed matches go to `config.default_layer`. Either every layer is written or,
/// on error, none is.
pub fn project(
    text: &mut Text,
    matches: &[Match],
    config: &AnnotateConfig,
) -> GrammarResult<Vec<String>> {
    let mut groups: BTreeMap<&str, BTreeSet<Span>> = BTreeMap::new();
    for m in matches {
        let name = m.name().unwrap_or(&config.default_layer);
        groups.entry(name).or_default().insert(m.span());
        if config.project_parts {
            for part in m.named_parts() {
                if let Some(name) = part.name() {
                    groups.entry(name).or_default().insert(part.span());
                }
            }
        }
    }

    for &name in groups.keys() {
        check_identifier(name).map_err(|reason| LayerError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        if text.has_layer(name) {
            text.ensure_replaceable(name)?;
        }
    }

    let mut written = Vec::with_capacity(groups.len());
    for (name, spans) in groups {
        let mut layer = Layer::new(name);
        for span in spans {
            layer.add_span(span, Annotation::new())?;
        }
        debug!(layer = name, spans = layer.len(), "projected matches");
        text.set_layer(layer)?;
        written.push(name.to_string());
    }
    Ok(written)
}

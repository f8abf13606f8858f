//! Evaluation of grammar symbols against a [`Text`].
//!
//! Every symbol's output is ascending by `(start, end)`, with ties kept in the order
//! the symbol produced them: pattern matches left to right, layer spans in layer order,
//! union candidates in child order. This is the order the conflict resolver sees.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use super::matches::Match;
use super::resolver::ConflictResolver;
use super::symbol::{Grammar, Symbol, SymbolId, TokenSet};
use crate::error::{GrammarError, GrammarResult, LayerError};
use crate::layer::LayerSpan;
use crate::span::Bounded;
use crate::span_ops::{hovering_right, touching_right};
use crate::text::Text;
use crate::value::Value;

/// Match lists of the symbols evaluated so far in one pass, keyed by symbol.
///
/// A cache belongs to one grammar and one text; start a fresh one for every pass.
#[derive(Debug, Default)]
pub struct EvalCache {
    matches: HashMap<SymbolId, Rc<Vec<Match>>>,
    evaluations: HashMap<SymbolId, usize>,
}

impl EvalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached matches of a symbol.
    pub fn get(&self, id: SymbolId) -> Option<&[Match]> {
        self.matches.get(&id).map(|m| m.as_slice())
    }

    /// How many times the symbol was computed rather than read from the cache.
    pub fn evaluations(&self, id: SymbolId) -> usize {
        self.evaluations.get(&id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

type Combine = fn(&str, &[Match], &[Match]) -> Vec<Match>;

impl Grammar {
    /// Evaluate `root` and resolve conflicts among its matches.
    ///
    /// Sub-symbols are evaluated once each, and only the root output is resolved.
    pub fn get_matches(
        &self,
        root: SymbolId,
        text: &Text,
        resolver: &dyn ConflictResolver,
    ) -> GrammarResult<Vec<Match>> {
        let mut cache = EvalCache::new();
        let matches = self.evaluate(root, text, &mut cache)?;
        drop(cache);
        let matches = Rc::try_unwrap(matches).unwrap_or_else(|shared| shared.as_ref().clone());
        Ok(resolver.resolve(matches))
    }

    /// Raw, unresolved matches of `id`, reusing and filling `cache`.
    pub fn evaluate(
        &self,
        id: SymbolId,
        text: &Text,
        cache: &mut EvalCache,
    ) -> GrammarResult<Rc<Vec<Match>>> {
        if let Some(hit) = cache.matches.get(&id) {
            trace!(symbol = id.index(), "cache hit");
            return Ok(Rc::clone(hit));
        }

        let node = self.node(id)?;
        let source = text.as_str();
        let mut matches = match &node.symbol {
            Symbol::Pattern(regex) => regex
                .find_iter(source)
                .map(|m| Match::leaf(source, m.start(), m.end(), None))
                .collect(),
            Symbol::Lexemes(set) | Symbol::Tags(set) => token_matches(set, text)?,
            Symbol::Layer(name) => text
                .layer(name)
                .ok_or_else(|| GrammarError::MissingLayer(name.clone()))?
                .iter()
                .map(|span| Match::leaf(source, span.start(), span.end(), None))
                .collect(),
            Symbol::Union(children) => {
                let mut all = Vec::new();
                for &child in children {
                    all.extend(self.evaluate(child, text, cache)?.iter().cloned());
                }
                all
            }
            Symbol::Concatenation(children) => self.fold(children, text, cache, concatenate)?,
            Symbol::Gaps(children) => self.fold(children, text, cache, nearest_gaps)?,
            Symbol::AllGaps(children) => self.fold(children, text, cache, all_gaps)?,
        };
        matches.sort_by_key(|m| m.bounds());
        if let Some(name) = &node.name {
            matches = matches.into_iter().map(|m| m.renamed(name)).collect();
        }

        trace!(
            symbol = id.index(),
            name = node.name.as_deref().unwrap_or(""),
            matches = matches.len(),
            "evaluated symbol"
        );
        *cache.evaluations.entry(id).or_insert(0) += 1;
        let matches = Rc::new(matches);
        cache.matches.insert(id, Rc::clone(&matches));
        Ok(matches)
    }

    /// Combine child outputs pairwise, left-associated.
    fn fold(
        &self,
        children: &[SymbolId],
        text: &Text,
        cache: &mut EvalCache,
        combine: Combine,
    ) -> GrammarResult<Vec<Match>> {
        let (&first, rest) = children
            .split_first()
            .ok_or(GrammarError::EmptyCombinator("combinator"))?;
        let mut acc = self.evaluate(first, text, cache)?.as_ref().clone();
        for &child in rest {
            let right = self.evaluate(child, text, cache)?;
            acc = combine(text.as_str(), &acc, &right);
            acc.sort_by_key(|m| m.bounds());
        }
        Ok(acc)
    }
}

fn token_matches(set: &TokenSet, text: &Text) -> GrammarResult<Vec<Match>> {
    let layer = text
        .layer(set.layer())
        .ok_or_else(|| GrammarError::MissingLayer(set.layer().to_string()))?;
    if !layer.attributes().iter().any(|a| a == set.attribute()) {
        return Err(LayerError::UnknownAttribute {
            layer: set.layer().to_string(),
            attribute: set.attribute().to_string(),
        }
        .into());
    }

    let source = text.as_str();
    Ok(layer
        .iter()
        .filter(|span| span.values(set.attribute()).any(|v| in_set(set, v, span)))
        .map(|span| Match::leaf(source, span.start(), span.end(), None))
        .collect())
}

fn in_set(set: &TokenSet, value: &Value, span: &LayerSpan) -> bool {
    match value {
        Value::Str(s) => set.contains(s),
        Value::List(items) => items.iter().any(|item| in_set(set, item, span)),
        Value::Null => false,
        other => {
            warn!(
                layer = set.layer(),
                attribute = set.attribute(),
                span = %span.span(),
                value = %other,
                "skipping token with a non-string value"
            );
            false
        }
    }
}

/// Join every `a` with the `b` spans starting exactly where it ends.
///
/// A two-cursor merge over both ascending inputs.
pub(crate) fn concatenate(source: &str, left: &[Match], right: &[Match]) -> Vec<Match> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let (a, b) = (&left[i], &right[j]);
        if touching_right(a, b) {
            out.push(Match::join(source, a, b));
            j += 1;
        } else if hovering_right(a, b) {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Join every `a` with the first `b` that starts at or after its end.
pub(crate) fn nearest_gaps(source: &str, left: &[Match], right: &[Match]) -> Vec<Match> {
    left.iter()
        .filter_map(|a| {
            let from = right.partition_point(|b| b.start() < a.end());
            right.get(from).map(|b| Match::join(source, a, b))
        })
        .collect()
}

/// Join every `a` with every `b` that starts at or after its end.
pub(crate) fn all_gaps(source: &str, left: &[Match], right: &[Match]) -> Vec<Match> {
    left.iter()
        .flat_map(|a| {
            let from = right.partition_point(|b| b.start() < a.end());
            right[from..].iter().map(move |b| Match::join(source, a, b))
        })
        .collect()
}

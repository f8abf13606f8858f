//! Conflict resolution over candidate matches.
//!
//! Grammar combinators are conflict-agnostic and may produce overlapping candidates.
//! A [`ConflictResolver`] decides which of them survive; it runs once, on the root
//! symbol's output.

use std::cmp::Ordering;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matches::Match;
use crate::error::GrammarError;
use crate::span::Bounded;

pub trait ConflictResolver {
    /// Select the surviving matches, returned ascending by `(start, end)`.
    fn resolve(&self, matches: Vec<Match>) -> Vec<Match>;
}

/// Keep the non-conflicting subset with the largest total length.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximalCoverage;

/// Keep every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepAll;

impl ConflictResolver for MaximalCoverage {
    fn resolve(&self, matches: Vec<Match>) -> Vec<Match> {
        let candidates = matches.len();
        let selected = maximal_coverage(matches);
        debug!(candidates, selected = selected.len(), "resolved conflicts");
        selected
    }
}

impl ConflictResolver for KeepAll {
    fn resolve(&self, mut matches: Vec<Match>) -> Vec<Match> {
        matches.sort_by_key(|m| m.bounds());
        matches
    }
}

/// Weighted interval scheduling: the pairwise non-conflicting subset of `items` with
/// the largest summed length.
///
/// Among equally heavy subsets, their input positions are compared in ascending order
/// and the first difference decides, so earlier inputs are kept on ties. Empty items
/// carry no weight and are never selected. The result is ascending by `(start, end)`.
pub fn maximal_coverage<T: Bounded>(items: Vec<T>) -> Vec<T> {
    let mut items: Vec<(usize, T)> = items
        .into_iter()
        .filter(|item| !item.is_empty())
        .enumerate()
        .collect();
    // stable, so equal ends keep input order
    items.sort_by_key(|(_, item)| item.end());

    let n = items.len();
    let ends: Vec<usize> = items.iter().map(|(_, item)| item.end()).collect();
    // best[k] / chosen[k]: optimum over the first k items and its sorted input indices
    let mut best = vec![0usize; n + 1];
    let mut chosen: Vec<Rc<Vec<usize>>> = vec![Rc::new(Vec::new()); n + 1];

    for (k, (index, item)) in items.iter().enumerate() {
        // everything before `p` ends at or before `item` starts
        let p = ends[..k].partition_point(|&end| end <= item.start());

        let with = best[p] + item.len();
        let without = best[k];

        let taken = match with.cmp(&without) {
            Ordering::Greater => Some(with_index(&chosen[p], *index)),
            Ordering::Equal => Some(with_index(&chosen[p], *index))
                .filter(|with_chosen| with_chosen < chosen[k].as_ref()),
            Ordering::Less => None,
        };

        match taken {
            Some(with_chosen) => {
                best[k + 1] = with;
                chosen[k + 1] = Rc::new(with_chosen);
            }
            None => {
                best[k + 1] = without;
                chosen[k + 1] = Rc::clone(&chosen[k]);
            }
        }
    }

    let keep = &chosen[n];
    let mut selected: Vec<T> = items
        .into_iter()
        .filter(|(index, _)| keep.binary_search(index).is_ok())
        .map(|(_, item)| item)
        .collect();
    selected.sort_by_key(|item| item.bounds());
    selected
}

fn with_index(chosen: &[usize], index: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(chosen.len() + 1);
    let at = chosen.partition_point(|&i| i < index);
    out.extend_from_slice(&chosen[..at]);
    out.push(index);
    out.extend_from_slice(&chosen[at..]);
    out
}

/// Resolver selection, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    MaximalCoverage,
    KeepAll,
}

impl ResolverKind {
    pub fn resolver(self) -> &'static dyn ConflictResolver {
        match self {
            ResolverKind::MaximalCoverage => &MaximalCoverage,
            ResolverKind::KeepAll => &KeepAll,
        }
    }
}

impl Default for ResolverKind {
    fn default() -> Self {
        ResolverKind::MaximalCoverage
    }
}

impl FromStr for ResolverKind {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maximal_coverage" => Ok(ResolverKind::MaximalCoverage),
            "keep_all" => Ok(ResolverKind::KeepAll),
            other => Err(GrammarError::UnknownResolver(other.to_string())),
        }
    }
}

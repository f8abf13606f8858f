use std::fmt;

use crate::span::{Bounded, Span};

/// A span of the text produced by a grammar symbol.
///
/// Concatenation and gap matches remember the two matches they were joined from, so
/// that named sub-symbols can be recovered from a root match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    start: usize,
    end: usize,
    text: String,
    name: Option<String>,
    parts: Option<Box<(Match, Match)>>,
}

impl Match {
    /// A leaf match covering `source[start..end]`.
    pub(crate) fn leaf(source: &str, start: usize, end: usize, name: Option<&str>) -> Self {
        Self {
            start,
            end,
            text: source[start..end].to_string(),
            name: name.map(str::to_string),
            parts: None,
        }
    }

    /// The match spanning from the start of `left` to the end of `right`.
    pub(crate) fn join(source: &str, left: &Match, right: &Match) -> Self {
        Self {
            start: left.start,
            end: right.end,
            text: source[left.start..right.end].to_string(),
            name: None,
            parts: Some(Box::new((left.clone(), right.clone()))),
        }
    }

    pub(crate) fn renamed(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn span(&self) -> Span {
        Span::ordered(self.start, self.end)
    }

    /// The covered text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Name of the symbol that produced this match, if it was named.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parts(&self) -> Option<(&Match, &Match)> {
        self.parts.as_ref().map(|p| (&p.0, &p.1))
    }

    /// Named matches strictly below this one, left to right, outermost first.
    pub fn named_parts(&self) -> Vec<&Match> {
        let mut found = Vec::new();
        self.collect_named(&mut found);
        found
    }

    fn collect_named<'a>(&'a self, found: &mut Vec<&'a Match>) {
        if let Some((left, right)) = self.parts() {
            for part in [left, right].iter() {
                if part.name.is_some() {
                    found.push(*part);
                }
                part.collect_named(found);
            }
        }
    }

    /// An indented tree of this match and the matches it was joined from.
    pub fn explain(&self) -> String {
        Explain { node: self, depth: 0 }.to_string()
    }
}

struct Explain<'a> {
    node: &'a Match,
    depth: usize,
}

impl fmt::Display for Explain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.node, indent = 2 * self.depth)?;
        if let Some((left, right)) = self.node.parts() {
            for part in [left, right].iter() {
                let child = Explain {
                    node: part,
                    depth: self.depth + 1,
                };
                write!(f, "{}", child)?;
            }
        }
        Ok(())
    }
}

impl Bounded for Match {
    fn start(&self) -> usize {
        self.start
    }

    fn end(&self) -> usize {
        self.end
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.span(), self.text)?;
        if let Some(name) = &self.name {
            write!(f, " {}", name)?;
        }
        Ok(())
    }
}

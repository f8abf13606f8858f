use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use crate::error::{GrammarError, GrammarResult};
use crate::names::check_identifier;

/// Layer the lexeme and tag terminals read.
pub const MORPH_LAYER: &str = "morph_analysis";
/// Attribute read by lexeme terminals.
pub const LEMMA_ATTRIBUTE: &str = "lemma";
/// Attribute read by tag terminals.
pub const TAG_ATTRIBUTE: &str = "partofspeech";

/// Handle of a symbol within its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Membership set matched against one attribute of a token layer.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub(crate) layer: String,
    pub(crate) attribute: String,
    /// Lowercased members.
    pub(crate) members: BTreeSet<String>,
}

impl TokenSet {
    fn new<I, S>(layer: &str, attribute: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            layer: layer.to_string(),
            attribute: attribute.to_string(),
            members: members
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Case-insensitive membership.
    pub fn contains(&self, value: &str) -> bool {
        self.members.contains(&value.to_lowercase())
    }
}

/// A grammar node.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// Every non-overlapping, leftmost match of a regular expression on the raw text.
    Pattern(Regex),
    /// Token spans whose lemma is in the set.
    Lexemes(TokenSet),
    /// Token spans whose part-of-speech tag is in the set.
    Tags(TokenSet),
    /// Every span of an attached layer.
    Layer(String),
    /// Matches of any child.
    Union(Vec<SymbolId>),
    /// Adjacent matches of all children, left to right.
    Concatenation(Vec<SymbolId>),
    /// Each left match joined with the nearest right match starting at or after its end.
    Gaps(Vec<SymbolId>),
    /// Each left match joined with every right match starting at or after its end.
    AllGaps(Vec<SymbolId>),
}

impl Symbol {
    /// Children of a combinator; empty for terminals.
    pub fn children(&self) -> &[SymbolId] {
        match self {
            Symbol::Union(c) | Symbol::Concatenation(c) | Symbol::Gaps(c) | Symbol::AllGaps(c) => c,
            _ => &[],
        }
    }

    /// The layer a terminal reads, if any.
    pub fn required_layer(&self) -> Option<&str> {
        match self {
            Symbol::Lexemes(set) | Symbol::Tags(set) => Some(&set.layer),
            Symbol::Layer(name) => Some(name),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Symbol::Pattern(_) => "pattern",
            Symbol::Lexemes(_) => "lexemes",
            Symbol::Tags(_) => "tags",
            Symbol::Layer(_) => "layer",
            Symbol::Union(_) => "union",
            Symbol::Concatenation(_) => "concatenation",
            Symbol::Gaps(_) => "gaps",
            Symbol::AllGaps(_) => "all_gaps",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) symbol: Symbol,
}

/// A set of symbols, each built from symbols added before it.
///
/// Since a combinator can only refer to existing symbols, the graph is acyclic by
/// construction. Sub-symbols may be shared by several parents.
///
/// ```
/// use layered_text::grammar::{Grammar, KeepAll};
/// use layered_text::Text;
///
/// let mut grammar = Grammar::new();
/// let number = grammar.pattern(r"\d+", Some("number")).unwrap();
/// let unit = grammar.ipattern(r"\s*(kg|g)\b", None).unwrap();
/// let weight = grammar.concatenation(&[number, unit], Some("weight")).unwrap();
///
/// let text = Text::new("Take 200 g of flour");
/// let matches = grammar.get_matches(weight, &text, &KeepAll).unwrap();
/// assert_eq!(matches[0].text(), "200 g");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    nodes: Vec<Node>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.nodes.get(id.0).map(|n| &n.symbol)
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.nodes.get(id.0).and_then(|n| n.name.as_deref())
    }

    /// Find a symbol by name. The first symbol added under that name wins.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
            .map(SymbolId)
    }

    pub(crate) fn node(&self, id: SymbolId) -> GrammarResult<&Node> {
        self.nodes
            .get(id.0)
            .ok_or(GrammarError::UnknownSymbol(id.0))
    }

    /// Layers the text must carry before `root` can be evaluated.
    pub fn required_layers(&self, root: SymbolId) -> GrammarResult<BTreeSet<String>> {
        let mut layers = BTreeSet::new();
        let mut stack = vec![root];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if std::mem::replace(&mut seen[id.0], true) {
                continue;
            }
            if let Some(layer) = node.symbol.required_layer() {
                layers.insert(layer.to_string());
            }
            stack.extend_from_slice(node.symbol.children());
        }
        Ok(layers)
    }

    fn push(&mut self, symbol: Symbol, name: Option<&str>) -> GrammarResult<SymbolId> {
        if let Some(name) = name {
            check_identifier(name).map_err(|reason| GrammarError::InvalidName {
                name: name.to_string(),
                reason,
            })?;
        }
        if let Some(&missing) = symbol.children().iter().find(|c| c.0 >= self.nodes.len()) {
            return Err(GrammarError::UnknownSymbol(missing.0));
        }
        let combinator = matches!(
            symbol,
            Symbol::Union(_) | Symbol::Concatenation(_) | Symbol::Gaps(_) | Symbol::AllGaps(_)
        );
        if combinator && symbol.children().is_empty() {
            return Err(GrammarError::EmptyCombinator(symbol.kind()));
        }
        self.nodes.push(Node {
            name: name.map(str::to_string),
            symbol,
        });
        Ok(SymbolId(self.nodes.len() - 1))
    }

    fn compile(pattern: &str, case_insensitive: bool) -> GrammarResult<Regex> {
        RegexBuilder::new(pattern)
            .multi_line(true)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| GrammarError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// A regular-expression terminal. `^` and `$` match at line boundaries.
    pub fn pattern(&mut self, pattern: &str, name: Option<&str>) -> GrammarResult<SymbolId> {
        let regex = Self::compile(pattern, false)?;
        self.push(Symbol::Pattern(regex), name)
    }

    /// A case-insensitive regular-expression terminal.
    pub fn ipattern(&mut self, pattern: &str, name: Option<&str>) -> GrammarResult<SymbolId> {
        let regex = Self::compile(pattern, true)?;
        self.push(Symbol::Pattern(regex), name)
    }

    /// Tokens of the morphological layer whose lemma is one of `lexemes`, ignoring case.
    pub fn lexemes<I, S>(&mut self, lexemes: I, name: Option<&str>) -> GrammarResult<SymbolId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = TokenSet::new(MORPH_LAYER, LEMMA_ATTRIBUTE, lexemes);
        self.push(Symbol::Lexemes(set), name)
    }

    /// Tokens of the morphological layer whose part-of-speech tag is one of `tags`.
    pub fn tags<I, S>(&mut self, tags: I, name: Option<&str>) -> GrammarResult<SymbolId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = TokenSet::new(MORPH_LAYER, TAG_ATTRIBUTE, tags);
        self.push(Symbol::Tags(set), name)
    }

    /// Every span of the named layer.
    pub fn layer(&mut self, layer: &str, name: Option<&str>) -> GrammarResult<SymbolId> {
        self.push(Symbol::Layer(layer.to_string()), name)
    }

    pub fn union(&mut self, children: &[SymbolId], name: Option<&str>) -> GrammarResult<SymbolId> {
        self.push(Symbol::Union(children.to_vec()), name)
    }

    pub fn concatenation(
        &mut self,
        children: &[SymbolId],
        name: Option<&str>,
    ) -> GrammarResult<SymbolId> {
        self.push(Symbol::Concatenation(children.to_vec()), name)
    }

    pub fn gaps(&mut self, children: &[SymbolId], name: Option<&str>) -> GrammarResult<SymbolId> {
        self.push(Symbol::Gaps(children.to_vec()), name)
    }

    pub fn all_gaps(
        &mut self,
        children: &[SymbolId],
        name: Option<&str>,
    ) -> GrammarResult<SymbolId> {
        self.push(Symbol::AllGaps(children.to_vec()), name)
    }
}

//! Grammar terminals built from vocabulary keys and columns.

use layered_text::grammar::{Grammar, SymbolId};

use crate::errors::{VocabularyError, VocabularyResult};
use crate::vocabulary::{VocabValue, Vocabulary};

impl Vocabulary {
    /// A lexeme terminal matching tokens whose lemma is one of the keys.
    pub fn lexeme_symbol(
        &self,
        grammar: &mut Grammar,
        name: Option<&str>,
    ) -> VocabularyResult<SymbolId> {
        Ok(grammar.lexemes(self.keys(), name)?)
    }

    /// A tag terminal matching tokens whose part-of-speech tag is one of the keys.
    pub fn tag_symbol(&self, grammar: &mut Grammar, name: Option<&str>) -> VocabularyResult<SymbolId> {
        Ok(grammar.tags(self.keys(), name)?)
    }

    /// A union of pattern terminals, one per record carrying the `regex` column
    /// `column`.
    pub fn pattern_symbol(
        &self,
        grammar: &mut Grammar,
        column: &str,
        name: Option<&str>,
    ) -> VocabularyResult<SymbolId> {
        let mut children = Vec::new();
        for (_, record) in self.records() {
            match record.get(column) {
                Some(VocabValue::Regex(regex)) => children.push(grammar.pattern(regex.as_str(), None)?),
                Some(_) => return Err(VocabularyError::NotARegexColumn(column.to_string())),
                None => {}
            }
        }
        Ok(grammar.union(&children, name)?)
    }

    /// A union of pattern terminals matching each key literally.
    pub fn literal_symbol(
        &self,
        grammar: &mut Grammar,
        case_insensitive: bool,
        name: Option<&str>,
    ) -> VocabularyResult<SymbolId> {
        let mut children = Vec::with_capacity(self.len());
        for key in self.keys() {
            let pattern = regex::escape(key);
            let child = if case_insensitive {
                grammar.ipattern(&pattern, None)?
            } else {
                grammar.pattern(&pattern, None)?
            };
            children.push(child);
        }
        Ok(grammar.union(&children, name)?)
    }
}

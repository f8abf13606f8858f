//! Morphological analysis over an abstract analyzer.
//!
//! [`MorphTagger`] asks a [`MorphAnalyzer`] for the readings of every word and stores
//! them as the ambiguous `morph_analysis` layer, one annotation record per reading.
//! Lexeme and tag terminals of a grammar read this layer.

use std::collections::{BTreeMap, HashMap};

use layered_text::grammar::{LEMMA_ATTRIBUTE, MORPH_LAYER, TAG_ATTRIBUTE};
use layered_text::{Annotation, Layer, Text};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{TaggerError, TaggerResult};
use crate::segmentation::WORDS;
use crate::Tagger;

pub const FORM_ATTRIBUTE: &str = "form";

/// Attributes of the `morph_analysis` layer.
pub const MORPH_ATTRIBUTES: [&str; 3] = [LEMMA_ATTRIBUTE, TAG_ATTRIBUTE, FORM_ATTRIBUTE];

/// One morphological reading of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub lemma: String,
    pub part_of_speech: String,
    /// Inflectional form, such as `"sg n"`; empty when the analyzer gives none.
    #[serde(default)]
    pub form: String,
}

impl Reading {
    pub fn new(
        lemma: impl Into<String>,
        part_of_speech: impl Into<String>,
        form: impl Into<String>,
    ) -> Self {
        Self {
            lemma: lemma.into(),
            part_of_speech: part_of_speech.into(),
            form: form.into(),
        }
    }

    fn to_annotation(&self) -> Annotation {
        Annotation::new()
            .with(LEMMA_ATTRIBUTE, self.lemma.as_str())
            .with(TAG_ATTRIBUTE, self.part_of_speech.as_str())
            .with(FORM_ATTRIBUTE, self.form.as_str())
    }
}

/// Produces every reading of a single token.
///
/// An empty result means the token is unknown to the analyzer.
pub trait MorphAnalyzer {
    fn analyze(&self, token: &str) -> Vec<Reading>;
}

/// An in-memory analyzer looking tokens up in a table, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct LexiconAnalyzer {
    entries: HashMap<String, Vec<Reading>>,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a lexicon written as a RON map from token to readings.
    ///
    /// ```
    /// use layered_taggers::{LexiconAnalyzer, MorphAnalyzer};
    ///
    /// let lexicon = LexiconAnalyzer::from_ron(r#"{
    ///     "kuud": [
    ///         (lemma: "kuu", part_of_speech: "S", form: "pl n"),
    ///         (lemma: "kuus", part_of_speech: "S", form: "sg p"),
    ///     ],
    /// }"#).unwrap();
    /// assert_eq!(lexicon.analyze("Kuud").len(), 2);
    /// ```
    pub fn from_ron(input: &str) -> TaggerResult<Self> {
        // sorted keys, so tokens merged by case keep a fixed reading order
        let table: BTreeMap<String, Vec<Reading>> =
            ron::from_str(input).map_err(|e| TaggerError::Lexicon(e.to_string()))?;
        let mut lexicon = Self::new();
        for (token, readings) in table {
            for reading in readings {
                lexicon.insert(&token, reading);
            }
        }
        Ok(lexicon)
    }

    /// Add a reading for `token`; readings of a token keep their insertion order.
    pub fn insert(&mut self, token: &str, reading: Reading) {
        self.entries
            .entry(token.to_lowercase())
            .or_default()
            .push(reading);
    }

    /// Takes self
    pub fn with_reading(mut self, token: &str, reading: Reading) -> Self {
        self.insert(token, reading);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MorphAnalyzer for LexiconAnalyzer {
    fn analyze(&self, token: &str) -> Vec<Reading> {
        self.entries
            .get(&token.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

/// Builds the ambiguous `morph_analysis` layer over `words`.
///
/// Words without any reading get no span.
#[derive(Debug, Clone)]
pub struct MorphTagger<A> {
    analyzer: A,
}

impl<A: MorphAnalyzer> MorphTagger<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }
}

impl<A: MorphAnalyzer> Tagger for MorphTagger<A> {
    fn output_layer(&self) -> &str {
        MORPH_LAYER
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        let words = text.get(WORDS)?;
        let mut layer = Layer::new(MORPH_LAYER)
            .with_parent(WORDS)
            .with_attributes(MORPH_ATTRIBUTES.iter().copied())
            .ambiguous();

        let mut unknown = 0;
        for word in words {
            let span = word.span();
            let token = span.text(text.as_str()).unwrap_or_default();
            let readings = self.analyzer.analyze(token);
            if readings.is_empty() {
                warn!(token, start = span.start(), "no readings, token skipped");
                unknown += 1;
                continue;
            }
            for reading in &readings {
                layer.add_span(span, reading.to_annotation())?;
            }
        }
        debug!(analyzed = layer.len(), unknown, "morphological analysis");
        Ok(layer)
    }
}

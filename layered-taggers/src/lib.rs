#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Taggers for layered-text.
//!
//! A tagger reads the layers already attached to a [`Text`] and builds one new layer.
//! Segmentation taggers work on the raw text alone; the others wrap an external
//! collaborator (a morphological analyzer, a dependency parser, a temporal expression
//! tagger) behind a trait and re-align its output onto the text.
//!
//! ## Usage
//!
//! ```
//! use layered_taggers::{SentenceTagger, Tagger, WordTagger};
//! use layered_text::Text;
//!
//! let mut text = Text::new("Kui mitu kuud on aastas? Kaksteist.");
//! WordTagger.tag(&mut text).unwrap();
//! SentenceTagger.tag(&mut text).unwrap();
//!
//! assert_eq!(
//!     text.enveloped_texts("sentences").unwrap(),
//!     vec![
//!         vec!["Kui", "mitu", "kuud", "on", "aastas", "?"],
//!         vec!["Kaksteist", "."],
//!     ]
//! );
//! ```
//!
//! ## Modules
//!
//! - [`segmentation`] - Whitespace tokens, words and sentences
//! - [`morph`] - Morphological readings over an abstract analyzer
//! - [`syntax`] - Dependency syntax through CoNLL exchange with a parser
//! - [`timex`] - Temporal expressions from an external tagger
//! - [`errors`] - Error types

use layered_text::{Layer, Text};

pub mod errors;
pub mod morph;
pub mod segmentation;
pub mod syntax;
pub mod timex;

pub use errors::{TaggerError, TaggerResult};
pub use morph::{LexiconAnalyzer, MorphAnalyzer, MorphTagger, Reading, MORPH_ATTRIBUTES};
pub use segmentation::{SentenceTagger, WhitespaceTokensTagger, WordTagger};
pub use syntax::{DependencyParser, ReturnType, SyntaxTagger};
pub use timex::{TimexProcess, TimexRecord, TimexTagger};

/// Builds one layer from the layers a text already carries.
pub trait Tagger {
    /// Name of the layer this tagger produces.
    fn output_layer(&self) -> &str;

    /// Build the output layer without touching the text.
    fn make_layer(&self, text: &Text) -> TaggerResult<Layer>;

    /// Build the output layer and attach it, replacing an earlier version.
    fn tag(&self, text: &mut Text) -> TaggerResult<()> {
        let layer = self.make_layer(text)?;
        text.set_layer(layer)?;
        Ok(())
    }
}

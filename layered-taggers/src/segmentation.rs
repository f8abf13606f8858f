//! Segmentation taggers: whitespace tokens, words and sentences.

use layered_text::{Annotation, EnvelopingSpan, Layer, Span, Text};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::TaggerResult;
use crate::Tagger;

pub const TOKENS: &str = "tokens";
pub const WORDS: &str = "words";
pub const SENTENCES: &str = "sentences";

/// Tokens separated by whitespace only; punctuation stays attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokensTagger;

impl Tagger for WhitespaceTokensTagger {
    fn output_layer(&self) -> &str {
        TOKENS
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        let source = text.as_str();
        let mut layer = Layer::new(TOKENS);
        let mut start = None;
        for (i, c) in source.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    layer.add_span(Span::ordered(s, i), Annotation::new())?;
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            layer.add_span(Span::ordered(s, source.len()), Annotation::new())?;
        }
        debug!(tokens = layer.len(), "whitespace tokens");
        Ok(layer)
    }
}

/// Words on Unicode word boundaries, with whitespace runs dropped.
///
/// Punctuation marks become words of their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTagger;

impl Tagger for WordTagger {
    fn output_layer(&self) -> &str {
        WORDS
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        let mut layer = Layer::new(WORDS);
        for (offset, word) in text.as_str().split_word_bound_indices() {
            if word.chars().all(char::is_whitespace) {
                continue;
            }
            layer.add_span(Span::ordered(offset, offset + word.len()), Annotation::new())?;
        }
        debug!(words = layer.len(), "words");
        Ok(layer)
    }
}

/// Sentences on Unicode sentence boundaries, enveloping the `words` layer.
///
/// A word belongs to the sentence its first byte falls in. Sentences holding no
/// words are left out.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceTagger;

impl Tagger for SentenceTagger {
    fn output_layer(&self) -> &str {
        SENTENCES
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        let words = text.get(WORDS)?.span_list();
        let mut layer = Layer::new(SENTENCES).enveloping(WORDS);

        let mut next = 0;
        for (offset, sentence) in text.as_str().split_sentence_bound_indices() {
            let end = offset + sentence.len();
            let first = next;
            while next < words.len() && words[next].start() < end {
                next += 1;
            }
            if first == next {
                continue;
            }
            if let Some(envelope) = EnvelopingSpan::from_indices(&words, (first..next).collect()) {
                layer.add_enveloping_span(envelope, Annotation::new())?;
            }
        }
        debug!(sentences = layer.len(), "sentences");
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use layered_text::{LayerError, TextDisplay};

    use super::*;
    use crate::TaggerError;

    #[test]
    fn whitespace_tokens_keep_punctuation() {
        let mut text = Text::new("Kui mitu kuud on aastas?");
        WhitespaceTokensTagger.tag(&mut text).unwrap();

        let display = TextDisplay::new(&text).with(TOKENS).unwrap();
        insta::assert_snapshot!(display, @r###"
        Kui mitu kuud on aastas?
        ╰─╯tokens
            ╰──╯tokens
                 ╰──╯tokens
                      ╰╯tokens
                         ╰─────╯tokens
        "###);
    }

    #[test]
    fn whitespace_tokens_of_blank_text() {
        let text = Text::new(" \n\t ");
        assert!(WhitespaceTokensTagger.make_layer(&text).unwrap().is_empty());
    }

    #[test]
    fn words_split_off_punctuation() {
        let mut text = Text::new("Kui mitu kuud on aastas?");
        WordTagger.tag(&mut text).unwrap();

        let display = TextDisplay::new(&text).with(WORDS).unwrap();
        insta::assert_snapshot!(display, @r###"
        Kui mitu kuud on aastas?
        ╰─╯words
            ╰──╯words
                 ╰──╯words
                      ╰╯words
                         ╰────╯words
                               ╰words
        "###);
    }

    #[test]
    fn words_use_byte_offsets() {
        let mut text = Text::new("Täna  öösel");
        WordTagger.tag(&mut text).unwrap();
        assert_eq!(
            text.spans(WORDS).unwrap(),
            vec![Span::new(0, 5).unwrap(), Span::new(7, 14).unwrap()]
        );
        assert_eq!(text.span_texts(WORDS).unwrap(), vec!["Täna", "öösel"]);
    }

    #[test]
    fn sentences_envelop_words() {
        let mut text = Text::new("Tere! Mis on?");
        WordTagger.tag(&mut text).unwrap();
        SentenceTagger.tag(&mut text).unwrap();

        let display = TextDisplay::new(&text)
            .with(WORDS)
            .unwrap()
            .with_links(SENTENCES)
            .unwrap();
        insta::assert_snapshot!(display, @r###"
        Tere! Mis on?
        ╰──╯[A] words
            ╰[B] words
              ╰─╯[C] words
                  ╰╯[D] words
                    ╰[E] words
        ╰───╯sentences
          └─child─>[A]
          └─child─>[B]
              ╰─────╯sentences
                └─child─>[C]
                └─child─>[D]
                └─child─>[E]
        "###);
    }

    #[test]
    fn sentences_need_words() {
        let mut text = Text::new("Tere!");
        let err = SentenceTagger.tag(&mut text).unwrap_err();
        assert!(matches!(err, TaggerError::Layer(LayerError::UnknownLayer(name)) if name == WORDS));
        assert!(!text.has_layer(SENTENCES));
    }

    #[test]
    fn retagging_replaces_the_layer() {
        let mut text = Text::new("Tere!");
        WordTagger.tag(&mut text).unwrap();
        WordTagger.tag(&mut text).unwrap();
        assert_eq!(text.layer_names().collect::<Vec<_>>(), vec![WORDS]);
    }
}

//! Dependency syntax through an external parser.
//!
//! The text is written out as a CoNLL document, one token line per word and a blank
//! line after every sentence:
//!
//! ```text
//! ID  FORM  LEMMA  CPOSTAG  POSTAG  FEATS  HEAD  DEPREL  _  _
//! ```
//!
//! The parser returns the same document with `HEAD` and `DEPREL` filled in; the
//! result is aligned back onto `words` as the `conll_syntax` layer.

use std::str::FromStr;

use layered_text::grammar::{LEMMA_ATTRIBUTE, MORPH_LAYER, TAG_ATTRIBUTE};
use layered_text::{Annotation, Layer, LayerSpan, Text, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{TaggerError, TaggerResult};
use crate::morph::FORM_ATTRIBUTE;
use crate::segmentation::{SENTENCES, WORDS};
use crate::Tagger;

pub const SYNTAX_LAYER: &str = "conll_syntax";
pub const SENT_ID_ATTRIBUTE: &str = "sent_id";
/// Position of the head word within the sentence, `-1` for the root.
pub const HEAD_ATTRIBUTE: &str = "head";
pub const DEPREL_ATTRIBUTE: &str = "deprel";

/// What [`SyntaxTagger::parse_text`] hands back besides attaching the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// Nothing; the text carries the result.
    Text,
    /// The parser's CoNLL output.
    Conll,
}

impl Default for ReturnType {
    fn default() -> Self {
        ReturnType::Text
    }
}

impl FromStr for ReturnType {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReturnType::Text),
            "conll" => Ok(ReturnType::Conll),
            _ => Err(TaggerError::UnknownReturnType(s.to_string())),
        }
    }
}

/// A dependency parser exchanging CoNLL documents.
pub trait DependencyParser {
    /// Parse `conll`, returning it with the `HEAD` and `DEPREL` columns filled.
    fn parse_conll(&self, conll: &str) -> TaggerResult<String>;
}

impl<F> DependencyParser for F
where
    F: Fn(&str) -> TaggerResult<String>,
{
    fn parse_conll(&self, conll: &str) -> TaggerResult<String> {
        self(conll)
    }
}

fn field(value: &str) -> String {
    if value.is_empty() {
        return "_".to_string();
    }
    value
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn first_str<'a>(reading: Option<&'a LayerSpan>, attribute: &str) -> &'a str {
    reading
        .and_then(|r| r.annotations().first())
        .and_then(|a| a.get(attribute))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Write the `sentences` and `words` of `text` as a CoNLL document.
///
/// Lemma, tag and form come from the first reading in `morph_analysis` when that
/// layer is attached; otherwise the columns are `_`.
pub fn to_conll(text: &Text) -> TaggerResult<String> {
    let words = text.get(WORDS)?;
    let sentences = text.get(SENTENCES)?;

    let mut readings: Vec<Option<&LayerSpan>> = vec![None; words.len()];
    if let Some(morph) = text.layer(MORPH_LAYER) {
        for span in morph {
            if let Some(slot) = span.parent_index().and_then(|i| readings.get_mut(i)) {
                *slot = Some(span);
            }
        }
    }

    let mut out = String::new();
    for sentence in sentences {
        for (position, &w) in sentence.children().unwrap_or_default().iter().enumerate() {
            let form = words
                .get(w)
                .and_then(|word| word.span().text(text.as_str()))
                .unwrap_or_default();
            let reading = readings.get(w).copied().flatten();
            let tag = field(first_str(reading, TAG_ATTRIBUTE));
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t_\t_\t_\t_\n",
                position + 1,
                field(form),
                field(first_str(reading, LEMMA_ATTRIBUTE)),
                tag,
                tag,
                field(&first_str(reading, FORM_ATTRIBUTE).replace(' ', "|")),
            ));
        }
        out.push('\n');
    }
    Ok(out)
}

#[derive(Debug)]
struct ConllToken {
    form: String,
    head: usize,
    deprel: String,
}

fn read_conll(output: &str) -> TaggerResult<Vec<Vec<ConllToken>>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for (i, line) in output.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 8 {
            return Err(TaggerError::Conll {
                line: i + 1,
                message: format!("expected at least 8 columns, found {}", columns.len()),
            });
        }
        let head = columns[6].parse::<usize>().map_err(|_| TaggerError::Conll {
            line: i + 1,
            message: format!("head {:?} is not a number", columns[6]),
        })?;
        current.push(ConllToken {
            form: columns[1].to_string(),
            head,
            deprel: columns[7].to_string(),
        });
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    Ok(sentences)
}

/// Attaches dependency relations from a [`DependencyParser`] as `conll_syntax`.
///
/// Needs `words` and `sentences`; uses `morph_analysis` when present. Parsed tokens
/// whose form does not match the word they align with are left out.
#[derive(Debug, Clone)]
pub struct SyntaxTagger<P> {
    parser: P,
}

impl<P: DependencyParser> SyntaxTagger<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Parse `text`, attach `conll_syntax`, and return the parser output when
    /// `return_type` asks for it.
    pub fn parse_text(&self, text: &mut Text, return_type: ReturnType) -> TaggerResult<Option<String>> {
        let (layer, output) = self.run(text)?;
        text.set_layer(layer)?;
        Ok(match return_type {
            ReturnType::Text => None,
            ReturnType::Conll => Some(output),
        })
    }

    fn run(&self, text: &Text) -> TaggerResult<(Layer, String)> {
        let input = to_conll(text)?;
        let output = self.parser.parse_conll(&input)?;
        let parsed = read_conll(&output)?;

        let words = text.get(WORDS)?;
        let sentences = text.get(SENTENCES)?;
        if parsed.len() != sentences.len() {
            warn!(
                expected = sentences.len(),
                found = parsed.len(),
                "parser returned a different number of sentences"
            );
        }

        let mut layer = Layer::new(SYNTAX_LAYER)
            .with_parent(WORDS)
            .with_attributes([SENT_ID_ATTRIBUTE, HEAD_ATTRIBUTE, DEPREL_ATTRIBUTE].iter().copied());
        for (sent_id, (sentence, tokens)) in sentences.iter().zip(&parsed).enumerate() {
            let children = sentence.children().unwrap_or_default();
            if children.len() != tokens.len() {
                warn!(
                    sent_id,
                    expected = children.len(),
                    found = tokens.len(),
                    "parser returned a different number of tokens"
                );
            }
            for (&w, token) in children.iter().zip(tokens) {
                let word = match words.get(w) {
                    Some(word) => word,
                    None => continue,
                };
                let form = word.span().text(text.as_str()).unwrap_or_default();
                if field(form) != token.form {
                    warn!(sent_id, word = form, parsed = %token.form, "token does not align, skipped");
                    continue;
                }
                if token.head > children.len() {
                    warn!(sent_id, head = token.head, "head outside the sentence, skipped");
                    continue;
                }
                let head = token.head as i64 - 1;
                layer.add_span(
                    word.span(),
                    Annotation::new()
                        .with(SENT_ID_ATTRIBUTE, sent_id)
                        .with(HEAD_ATTRIBUTE, head)
                        .with(DEPREL_ATTRIBUTE, token.deprel.as_str()),
                )?;
            }
        }
        debug!(aligned = layer.len(), "dependency syntax");
        Ok((layer, output))
    }
}

impl<P: DependencyParser> Tagger for SyntaxTagger<P> {
    fn output_layer(&self) -> &str {
        SYNTAX_LAYER
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        self.run(text).map(|(layer, _)| layer)
    }
}

#[cfg(test)]
mod tests {
    use layered_text::TextDisplay;

    use super::*;
    use crate::{LexiconAnalyzer, MorphTagger, Reading, SentenceTagger, WordTagger};

    fn segmented(source: &str) -> Text {
        let mut text = Text::new(source);
        WordTagger.tag(&mut text).unwrap();
        SentenceTagger.tag(&mut text).unwrap();
        text
    }

    /// Attaches every token to the first one of its sentence.
    fn first_is_root(conll: &str) -> TaggerResult<String> {
        let mut out = String::new();
        for line in conll.lines() {
            if line.is_empty() {
                out.push('\n');
                continue;
            }
            let mut columns: Vec<&str> = line.split('\t').collect();
            let root = columns[0] == "1";
            columns[6] = if root { "0" } else { "1" };
            columns[7] = if root { "root" } else { "dep" };
            out.push_str(&columns.join("\t"));
            out.push('\n');
        }
        Ok(out)
    }

    #[test]
    fn writes_conll_with_first_readings() {
        let mut text = segmented("Kaks kuud. Jah.");
        let lexicon = LexiconAnalyzer::new()
            .with_reading("kaks", Reading::new("kaks", "N", "sg n"))
            .with_reading("kuud", Reading::new("kuu", "S", "pl n"))
            .with_reading("kuud", Reading::new("kuus", "S", "sg p"));
        MorphTagger::new(lexicon).tag(&mut text).unwrap();

        assert_eq!(
            to_conll(&text).unwrap(),
            "1\tKaks\tkaks\tN\tN\tsg|n\t_\t_\t_\t_\n\
             2\tkuud\tkuu\tS\tS\tpl|n\t_\t_\t_\t_\n\
             3\t.\t_\t_\t_\t_\t_\t_\t_\t_\n\
             \n\
             1\tJah\t_\t_\t_\t_\t_\t_\t_\t_\n\
             2\t.\t_\t_\t_\t_\t_\t_\t_\t_\n\
             \n"
        );
    }

    #[test]
    fn aligns_heads_to_words() {
        let mut text = segmented("Kaks kuud. Jah.");
        let tagger = SyntaxTagger::new(first_is_root);
        assert_eq!(tagger.parse_text(&mut text, ReturnType::Text).unwrap(), None);

        let display = TextDisplay::new(&text).with(SYNTAX_LAYER).unwrap();
        insta::assert_snapshot!(display, @r###"
        Kaks kuud. Jah.
        ╰──╯conll_syntax {deprel: "root", head: -1, sent_id: 0}
             ╰──╯conll_syntax {deprel: "dep", head: 0, sent_id: 0}
                 ╰conll_syntax {deprel: "dep", head: 0, sent_id: 0}
                   ╰─╯conll_syntax {deprel: "root", head: -1, sent_id: 1}
                      ╰conll_syntax {deprel: "dep", head: 0, sent_id: 1}
        "###);
        assert_eq!(text.parent_span(SYNTAX_LAYER, 3).unwrap().span().start(), 11);
    }

    #[test]
    fn returns_parser_output_on_request() {
        let mut text = segmented("Jah.");
        let tagger = SyntaxTagger::new(first_is_root);
        let output = tagger.parse_text(&mut text, "CoNLL".parse().unwrap()).unwrap();
        assert_eq!(
            output.as_deref(),
            Some("1\tJah\t_\t_\t_\t_\t0\troot\t_\t_\n2\t.\t_\t_\t_\t_\t1\tdep\t_\t_\n\n")
        );
    }

    #[test]
    fn misaligned_tokens_are_skipped() {
        let text = segmented("Kaks kuud.");
        let tagger = SyntaxTagger::new(|conll: &str| first_is_root(&conll.replace("kuud", "kuu")));
        let layer = tagger.make_layer(&text).unwrap();
        assert_eq!(layer.len(), 2);
        assert!(layer.position(layered_text::Span::new(5, 9).unwrap()).is_none());
    }

    #[test]
    fn malformed_output_fails() {
        let text = segmented("Jah.");
        let tagger = SyntaxTagger::new(|_: &str| -> TaggerResult<String> {
            Ok("1\tJah\t_\t_\t_\t_\tx\troot\n".to_string())
        });
        assert!(matches!(
            tagger.make_layer(&text),
            Err(TaggerError::Conll { line: 1, .. })
        ));

        let failing = SyntaxTagger::new(|_: &str| -> TaggerResult<String> {
            Err(TaggerError::External {
                process: "parser",
                message: "exited with status 1".to_string(),
            })
        });
        assert!(matches!(
            failing.make_layer(&text),
            Err(TaggerError::External { .. })
        ));
    }

    #[test]
    fn return_type_from_str() {
        assert_eq!("text".parse::<ReturnType>().unwrap(), ReturnType::Text);
        assert_eq!(ReturnType::default(), ReturnType::Text);
        assert!(matches!(
            "trees".parse::<ReturnType>(),
            Err(TaggerError::UnknownReturnType(s)) if s == "trees"
        ));
    }
}

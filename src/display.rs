use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::error::LayerResult;
use crate::grammar::Match;
use crate::layer::SpanBase;
use crate::span::{Bounded, Span};
use crate::text::Text;

/// Convert a zero-based index to a base-26 label: A, B, ..., Z, AA, AB, ..., AZ, BA, ...
/// Similar to Excel column naming.
fn index_to_base26_label(mut n: usize) -> String {
    let mut result = String::new();
    loop {
        let remainder = n % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Internal representation of an included span for display.
struct IncludedSpan {
    span: Span,
    label: String,
    /// Relation name and target span, drawn as arrows below the span.
    links: Vec<(&'static str, Span)>,
}

/// Plain-text rendering of a text with spans of chosen layers underlined.
///
/// ```text
/// Kui mitu kuud
/// ╰─╯words
///     ╰──╯words
///          ╰──╯words
/// ```
pub struct TextDisplay<'a> {
    text: &'a Text,
    included: Vec<IncludedSpan>,
}

impl<'a> fmt::Display for TextDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // one display line; byte offsets stay valid since both are one byte wide
        let opening_line: String = self
            .text
            .as_str()
            .chars()
            .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
            .collect();
        f.write_str(&opening_line)?;

        let column = |offset: usize| UnicodeWidthStr::width(&opening_line[..offset]);
        let span_labels = self.build_span_labels();

        for included in self.included.iter() {
            f.write_char('\n')?;

            let start_char_idx = column(included.span.start());
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;

            let end_char_idx = column(included.span.end());
            let char_len = end_char_idx - start_char_idx;
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }

            if char_len > 1 {
                f.write_char('╯')?;
            }

            if let Some(label) = span_labels.get(&included.span) {
                write!(f, "{} ", label)?;
            }

            f.write_str(&included.label)?;

            for (relation, target) in &included.links {
                f.write_char('\n')?;
                for _ in 0..start_char_idx + 2 {
                    f.write_char(' ')?;
                }
                let target_str = match span_labels.get(target) {
                    Some(label) => label.clone(),
                    None => target.to_string(),
                };
                write!(f, "└─{}─>{}", relation, target_str)?;
            }
        }

        Ok(())
    }
}

impl<'a> TextDisplay<'a> {
    pub fn new(text: &'a Text) -> Self {
        TextDisplay {
            text,
            included: Vec::new(),
        }
    }

    /// Map link targets that are themselves displayed to labels like "[A]", "[B]".
    fn build_span_labels(&self) -> HashMap<Span, String> {
        let included: HashSet<Span> = self.included.iter().map(|i| i.span).collect();
        let mut targets: Vec<Span> = self
            .included
            .iter()
            .flat_map(|i| i.links.iter().map(|(_, target)| *target))
            .filter(|target| included.contains(target))
            .collect();
        targets.sort();
        targets.dedup();

        targets
            .into_iter()
            .enumerate()
            .map(|(i, span)| (span, format!("[{}]", index_to_base26_label(i))))
            .collect()
    }

    fn push_layer(&mut self, name: &str, with_links: bool) -> LayerResult<()> {
        let text = self.text;
        let layer = text.get(name)?;
        let dependency = match layer.dependency() {
            Some(target) => Some(text.get(target)?),
            None => None,
        };
        for layer_span in layer {
            let links: Vec<(&'static str, Span)> = match (with_links, dependency, layer_span.base()) {
                (true, Some(parent), SpanBase::Parent(i)) => {
                    parent.get(*i).map(|p| ("parent", p.span())).into_iter().collect()
                }
                (true, Some(base), SpanBase::Enveloping(children)) => children
                    .iter()
                    .filter_map(|&i| base.get(i))
                    .map(|child| ("child", child.span()))
                    .collect(),
                _ => Vec::new(),
            };
            for annotation in layer_span.annotations() {
                let label = if annotation.is_empty() {
                    name.to_string()
                } else {
                    format!("{} {}", name, annotation)
                };
                self.included.push(IncludedSpan {
                    span: layer_span.span(),
                    label,
                    links: links.clone(),
                });
            }
        }
        Ok(())
    }

    /// Underline every span of a layer, one line per annotation record.
    pub fn include(&mut self, layer: &str) -> LayerResult<()> {
        self.push_layer(layer, false)
    }

    /// Like [`include`](Self::include), also drawing arrows to the parent span or the
    /// enveloped base spans.
    pub fn include_with_links(&mut self, layer: &str) -> LayerResult<()> {
        self.push_layer(layer, true)
    }

    /// Underline grammar matches, labeled with their names.
    pub fn include_matches(&mut self, matches: &[Match]) {
        for m in matches {
            self.included.push(IncludedSpan {
                span: Span::ordered(m.start(), m.end()),
                label: m.name().unwrap_or("match").to_string(),
                links: Vec::new(),
            });
        }
    }

    /// Takes self
    pub fn with(mut self, layer: &str) -> LayerResult<Self> {
        self.include(layer)?;
        Ok(self)
    }

    /// Takes self, includes links
    pub fn with_links(mut self, layer: &str) -> LayerResult<Self> {
        self.include_with_links(layer)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::span::EnvelopingSpan;
    use crate::value::Annotation;

    #[test]
    fn test_index_to_base26_label() {
        assert_eq!(index_to_base26_label(0), "A");
        assert_eq!(index_to_base26_label(25), "Z");
        assert_eq!(index_to_base26_label(26), "AA");
        assert_eq!(index_to_base26_label(51), "AZ");
        assert_eq!(index_to_base26_label(701), "ZZ");
        assert_eq!(index_to_base26_label(702), "AAA");
    }

    fn text() -> Text {
        let mut text = Text::new("Kui mitu kuud");
        let mut words = Layer::new("words");
        for (start, end) in [(0, 3), (4, 8), (9, 13)].iter() {
            words
                .add_span(Span::new(*start, *end).unwrap(), Annotation::new())
                .unwrap();
        }
        text.add_layer(words).unwrap();
        text
    }

    #[test]
    fn underlines_layer_spans() {
        let text = text();
        let display = TextDisplay::new(&text).with("words").unwrap();
        insta::assert_snapshot!(display, @r###"
        Kui mitu kuud
        ╰─╯words
            ╰──╯words
                 ╰──╯words
        "###);
    }

    #[test]
    fn links_envelopes_to_children() {
        let mut text = text();
        let base = text.spans("words").unwrap();
        let mut phrases = Layer::new("phrases").enveloping("words");
        phrases
            .add_enveloping_span(
                EnvelopingSpan::from_indices(&base, vec![1, 2]).unwrap(),
                Annotation::new(),
            )
            .unwrap();
        text.add_layer(phrases).unwrap();

        let display = TextDisplay::new(&text)
            .with("words")
            .unwrap()
            .with_links("phrases")
            .unwrap();
        insta::assert_snapshot!(display, @r###"
        Kui mitu kuud
        ╰─╯words
            ╰──╯[A] words
                 ╰──╯[B] words
            ╰───────╯phrases
              └─child─>[A]
              └─child─>[B]
        "###);
    }
}

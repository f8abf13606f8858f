//! Temporal expressions from an external tagger.

use std::collections::HashMap;

use layered_text::{Annotation, Layer, Span, Text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{TaggerError, TaggerResult};
use crate::Tagger;

pub const TIMEX_LAYER: &str = "timexes";

/// Creation date used when none is given: every field unspecified.
pub const UNKNOWN_CREATION_DATE: &str = "XXXX-XX-XXTXX:XX";

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9X]{4}-[0-9X]{2}-[0-9X]{2}$").expect("date pattern is valid"));

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9X]{4}-[0-9X]{2}-[0-9X]{2}T[0-9X]{2}:[0-9X]{2}$")
        .expect("date-time pattern is valid")
});

/// One temporal expression reported by a [`TimexProcess`].
///
/// A process may report the same `tid` several times, once per token it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimexRecord {
    pub start: usize,
    pub end: usize,
    pub tid: String,
    #[serde(default)]
    pub timex_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub anchor_tid: Option<String>,
}

impl TimexRecord {
    fn is_normalized(&self) -> bool {
        self.timex_type.is_some() && self.value.is_some()
    }

    /// Widen to cover `other`; fields already set are kept.
    fn merge(&mut self, other: TimexRecord) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
        self.timex_type = self.timex_type.take().or(other.timex_type);
        self.value = self.value.take().or(other.value);
        self.anchor_tid = self.anchor_tid.take().or(other.anchor_tid);
    }
}

/// A temporal expression tagger run over raw text.
pub trait TimexProcess {
    /// Find the temporal expressions of `text`, resolving relative ones against
    /// `creation_date` (`YYYY-MM-DDTHH:MM`, unknown fields as `X`).
    fn process(&self, text: &str, creation_date: &str) -> TaggerResult<Vec<TimexRecord>>;
}

impl<F> TimexProcess for F
where
    F: Fn(&str, &str) -> TaggerResult<Vec<TimexRecord>>,
{
    fn process(&self, text: &str, creation_date: &str) -> TaggerResult<Vec<TimexRecord>> {
        self(text, creation_date)
    }
}

/// Bring a creation date to the `YYYY-MM-DDTHH:MM` form.
///
/// A bare date gets an unspecified time; no date at all is entirely unspecified.
///
/// ```
/// use layered_taggers::timex::normalize_creation_date;
///
/// assert_eq!(normalize_creation_date(Some("1986-12-21")).unwrap(), "1986-12-21TXX:XX");
/// assert_eq!(normalize_creation_date(None).unwrap(), "XXXX-XX-XXTXX:XX");
/// assert!(normalize_creation_date(Some("21.12.1986")).is_err());
/// ```
pub fn normalize_creation_date(date: Option<&str>) -> TaggerResult<String> {
    match date {
        None => Ok(UNKNOWN_CREATION_DATE.to_string()),
        Some(date) if DATE.is_match(date) => Ok(format!("{}TXX:XX", date)),
        Some(date) if DATE_TIME.is_match(date) => Ok(date.to_string()),
        Some(date) => Err(TaggerError::CreationDate(date.to_string())),
    }
}

/// Builds the `timexes` layer from a [`TimexProcess`].
///
/// Reports sharing a `tid` are merged into one span. Expressions without a type or a
/// value are dropped unless [`keep_unnormalized`](Self::keep_unnormalized) is set.
/// Offsets that do not fall on character boundaries of the text are dropped.
#[derive(Debug, Clone)]
pub struct TimexTagger<P> {
    process: P,
    creation_date: String,
    remove_unnormalized: bool,
}

impl<P: TimexProcess> TimexTagger<P> {
    pub fn new(process: P) -> Self {
        Self {
            process,
            creation_date: UNKNOWN_CREATION_DATE.to_string(),
            remove_unnormalized: true,
        }
    }

    pub fn with_creation_date(mut self, date: &str) -> TaggerResult<Self> {
        self.creation_date = normalize_creation_date(Some(date))?;
        Ok(self)
    }

    /// Takes self
    pub fn keep_unnormalized(mut self) -> Self {
        self.remove_unnormalized = false;
        self
    }

    pub fn creation_date(&self) -> &str {
        &self.creation_date
    }

    fn collect(&self, records: Vec<TimexRecord>) -> Vec<TimexRecord> {
        let mut merged: Vec<TimexRecord> = Vec::new();
        let mut by_tid: HashMap<String, usize> = HashMap::new();
        for record in records {
            match by_tid.get(&record.tid) {
                Some(&i) => merged[i].merge(record),
                None => {
                    by_tid.insert(record.tid.clone(), merged.len());
                    merged.push(record);
                }
            }
        }
        if self.remove_unnormalized {
            merged.retain(TimexRecord::is_normalized);
        }
        merged.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
        merged
    }
}

impl<P: TimexProcess> Tagger for TimexTagger<P> {
    fn output_layer(&self) -> &str {
        TIMEX_LAYER
    }

    fn make_layer(&self, text: &Text) -> TaggerResult<Layer> {
        let source = text.as_str();
        let records = self.process.process(source, &self.creation_date)?;
        let reported = records.len();

        let mut layer = Layer::new(TIMEX_LAYER)
            .with_attributes(["tid", "timex_type", "value", "anchor_tid"].iter().copied())
            .ambiguous();
        for record in self.collect(records) {
            let span = match Span::new(record.start, record.end) {
                Some(span) if span.text(source).is_some() => span,
                _ => {
                    warn!(
                        tid = %record.tid,
                        start = record.start,
                        end = record.end,
                        "timex does not fit the text, skipped"
                    );
                    continue;
                }
            };
            layer.add_span(
                span,
                Annotation::new()
                    .with("tid", record.tid)
                    .with("timex_type", record.timex_type)
                    .with("value", record.value)
                    .with("anchor_tid", record.anchor_tid),
            )?;
        }
        debug!(reported, timexes = layer.len(), "temporal expressions");
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use layered_text::TextDisplay;

    use super::*;

    fn record(start: usize, end: usize, tid: &str, value: Option<&str>) -> TimexRecord {
        TimexRecord {
            start,
            end,
            tid: tid.to_string(),
            timex_type: value.map(|_| "DATE".to_string()),
            value: value.map(str::to_string),
            anchor_tid: None,
        }
    }

    #[test]
    fn aligns_timexes() {
        let mut text = Text::new("Eile oli ilus, homme ka.");
        let tagger = TimexTagger::new(|_: &str, date: &str| -> TaggerResult<Vec<TimexRecord>> {
            assert_eq!(date, "1986-12-21TXX:XX");
            let mut tomorrow = record(15, 20, "t2", Some("1986-12-22"));
            tomorrow.anchor_tid = Some("t0".to_string());
            Ok(vec![tomorrow, record(0, 4, "t1", Some("1986-12-20"))])
        })
        .with_creation_date("1986-12-21")
        .unwrap();
        tagger.tag(&mut text).unwrap();

        let display = TextDisplay::new(&text).with(TIMEX_LAYER).unwrap();
        insta::assert_snapshot!(display, @r###"
        Eile oli ilus, homme ka.
        ╰──╯timexes {anchor_tid: null, tid: "t1", timex_type: "DATE", value: "1986-12-20"}
                       ╰───╯timexes {anchor_tid: "t0", tid: "t2", timex_type: "DATE", value: "1986-12-22"}
        "###);
    }

    #[test]
    fn merges_reports_of_one_timex() {
        let text = Text::new("kolm päeva tagasi");
        let process = |_: &str, _: &str| -> TaggerResult<Vec<TimexRecord>> {
            Ok(vec![
                record(0, 4, "t1", Some("P3D")),
                record(5, 11, "t1", None),
                record(12, 18, "t1", None),
                record(5, 11, "t2", None),
            ])
        };

        let layer = TimexTagger::new(process).make_layer(&text).unwrap();
        assert_eq!(layer.span_list(), vec![Span::new(0, 18).unwrap()]);

        let layer = TimexTagger::new(process)
            .keep_unnormalized()
            .make_layer(&text)
            .unwrap();
        assert_eq!(
            layer.span_list(),
            vec![Span::new(0, 18).unwrap(), Span::new(5, 11).unwrap()]
        );
    }

    #[test]
    fn drops_offsets_outside_the_text() {
        let text = Text::new("Täna");
        let tagger = TimexTagger::new(|_: &str, _: &str| -> TaggerResult<Vec<TimexRecord>> {
            Ok(vec![
                record(0, 2, "t1", Some("PRESENT_REF")),
                record(0, 9, "t2", Some("PRESENT_REF")),
                record(0, 5, "t3", Some("PRESENT_REF")),
            ])
        });
        let layer = tagger.make_layer(&text).unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.spans()[0].annotation().unwrap().get("tid").unwrap().as_str(), Some("t3"));
    }

    #[test]
    fn creation_dates() {
        assert_eq!(
            normalize_creation_date(Some("1986-12-21T10:30")).unwrap(),
            "1986-12-21T10:30"
        );
        assert_eq!(
            normalize_creation_date(Some("XXXX-XX-XX")).unwrap(),
            UNKNOWN_CREATION_DATE
        );

        let tagger = TimexTagger::new(|_: &str, _: &str| -> TaggerResult<Vec<TimexRecord>> {
            Ok(Vec::new())
        });
        assert_eq!(tagger.creation_date(), UNKNOWN_CREATION_DATE);
        assert!(matches!(
            tagger.with_creation_date("yesterday"),
            Err(TaggerError::CreationDate(date)) if date == "yesterday"
        ));
    }
}

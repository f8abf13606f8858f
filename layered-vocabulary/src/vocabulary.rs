use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{VocabularyError, VocabularyResult};

/// How the raw text of a column is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Kept verbatim.
    String,
    /// Compiled as a regular expression.
    Regex,
    /// Evaluated as a RON expression.
    Expr,
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ColumnType::String),
            "regex" => Ok(ColumnType::Regex),
            "expr" => Ok(ColumnType::Expr),
            other => Err(other.to_string()),
        }
    }
}

/// A typed column value.
#[derive(Debug, Clone)]
pub enum VocabValue {
    Str(String),
    Regex(Regex),
    Expr(ron::Value),
}

impl VocabValue {
    fn parse(column: &str, raw: String, column_type: ColumnType) -> VocabularyResult<Self> {
        match column_type {
            ColumnType::String => Ok(VocabValue::Str(raw)),
            ColumnType::Regex => match Regex::new(&raw) {
                Ok(regex) => Ok(VocabValue::Regex(regex)),
                Err(source) => Err(VocabularyError::Pattern {
                    column: column.to_string(),
                    value: raw,
                    source,
                }),
            },
            ColumnType::Expr => match ron::from_str::<ron::Value>(&raw) {
                Ok(value) => Ok(VocabValue::Expr(value)),
                Err(e) => Err(VocabularyError::Expr {
                    column: column.to_string(),
                    value: raw,
                    message: e.to_string(),
                }),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VocabValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<&Regex> {
        match self {
            VocabValue::Regex(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&ron::Value> {
        match self {
            VocabValue::Expr(v) => Some(v),
            _ => None,
        }
    }
}

/// One vocabulary record, without its key.
pub type VocabRecord = BTreeMap<String, VocabValue>;

/// Raw record: column name to unparsed text.
pub type RawRecord = BTreeMap<String, String>;

/// Keyed records with typed columns.
///
/// Several records may share a key; they are kept in input order.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    key: String,
    attributes: Vec<String>,
    entries: BTreeMap<String, Vec<VocabRecord>>,
}

#[derive(Deserialize)]
struct VocabularyFile {
    key: String,
    #[serde(default)]
    columns: BTreeMap<String, String>,
    #[serde(default)]
    defaults: BTreeMap<String, toml::Value>,
    #[serde(default)]
    records: Vec<BTreeMap<String, toml::Value>>,
}

fn scalar(value: toml::Value, column: &str, record: usize) -> VocabularyResult<String> {
    match value {
        toml::Value::String(s) => Ok(s),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        _ => Err(VocabularyError::NotScalar {
            column: column.to_string(),
            record,
        }),
    }
}

impl Vocabulary {
    /// Build a vocabulary from raw records.
    ///
    /// Each record is completed from `defaults`, then every column is parsed by its
    /// type in `column_types`; columns without a declared type are strings.
    pub fn from_records(
        records: Vec<RawRecord>,
        key: &str,
        defaults: &RawRecord,
        column_types: &BTreeMap<String, ColumnType>,
    ) -> VocabularyResult<Self> {
        if records.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let mut attributes: Vec<String> = Vec::new();
        let mut entries: BTreeMap<String, Vec<VocabRecord>> = BTreeMap::new();
        for (index, record) in records.into_iter().enumerate() {
            let mut raw = defaults.clone();
            raw.extend(record);
            let key_value = raw.remove(key).ok_or_else(|| VocabularyError::MissingKey {
                record: index,
                key: key.to_string(),
            })?;

            let mut parsed = VocabRecord::new();
            for (column, text) in raw {
                let column_type = column_types
                    .get(&column)
                    .copied()
                    .unwrap_or(ColumnType::String);
                let value = VocabValue::parse(&column, text, column_type)?;
                if !attributes.contains(&column) {
                    attributes.push(column.clone());
                }
                parsed.insert(column, value);
            }
            entries.entry(key_value).or_default().push(parsed);
        }
        attributes.sort();

        debug!(key, keys = entries.len(), "loaded vocabulary");
        Ok(Self {
            key: key.to_string(),
            attributes,
            entries,
        })
    }

    /// Read a TOML vocabulary.
    ///
    /// ```
    /// use layered_vocabulary::Vocabulary;
    ///
    /// let vocabulary = Vocabulary::from_toml_str(r#"
    ///     key = "lemma"
    ///
    ///     [columns]
    ///     pattern = "regex"
    ///
    ///     [[records]]
    ///     lemma = "kuu"
    ///     pattern = 'kuu\w*'
    /// "#).unwrap();
    /// assert!(vocabulary.contains("kuu"));
    /// ```
    pub fn from_toml_str(input: &str) -> VocabularyResult<Self> {
        let file: VocabularyFile = toml::from_str(input)?;

        let mut column_types = BTreeMap::new();
        for (column, tag) in file.columns {
            let column_type = tag
                .parse::<ColumnType>()
                .map_err(|tag| VocabularyError::UnknownColumnType {
                    column: column.clone(),
                    tag,
                })?;
            column_types.insert(column, column_type);
        }

        let mut defaults = RawRecord::new();
        for (column, value) in file.defaults {
            let text = scalar(value, &column, 0)?;
            defaults.insert(column, text);
        }

        let mut records = Vec::with_capacity(file.records.len());
        for (index, record) in file.records.into_iter().enumerate() {
            let mut raw = RawRecord::new();
            for (column, value) in record {
                let text = scalar(value, &column, index)?;
                raw.insert(column, text);
            }
            records.push(raw);
        }

        Self::from_records(records, &file.key, &defaults, &column_types)
    }

    pub fn from_path(path: impl AsRef<Path>) -> VocabularyResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Name of the key attribute.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Non-key attributes, sorted.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn get(&self, key: &str) -> Option<&[VocabRecord]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Every record with its key, keys ascending.
    pub fn records(&self) -> impl Iterator<Item = (&str, &VocabRecord)> {
        self.entries
            .iter()
            .flat_map(|(k, records)| records.iter().map(move |r| (k.as_str(), r)))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

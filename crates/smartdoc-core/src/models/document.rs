//! Documents and per-document field values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved record key holding the source filename.
pub const FILENAME_KEY: &str = "Filename";

/// Reserved record key holding the full cleaned text.
pub const TEXT_KEY: &str = "Text";

/// A document as handed over by the ingestion/cleanup stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, normally the source filename.
    pub id: String,
    /// Text as extracted from the source file.
    pub raw_text: String,
    /// Normalized text every later stage works on.
    pub cleaned_text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>, cleaned_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            cleaned_text: cleaned_text.into(),
        }
    }

    /// A document whose text needs no further cleanup.
    pub fn from_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(id, text.clone(), text)
    }

    /// The text spans are computed against.
    pub fn text(&self) -> &str {
        &self.cleaned_text
    }
}

/// Field name to extracted value; `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<String, Option<String>>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, normalizing blank strings and the literal `"None"` to absent.
    pub fn insert(&mut self, field: impl Into<String>, value: Option<String>) {
        let value = value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || trimmed == "None" {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        self.0.insert(field.into(), value);
    }

    /// Present, non-empty value for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|v| v.as_deref())
    }

    /// Whether the field was looked for at all.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with a value.
    pub fn found(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (k, v) in iter {
            values.insert(k, v.map(Into::into));
        }
        values
    }
}

/// One structured record: the fields found for a document plus its
/// filename and (optionally) its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    pub filename: String,
    pub text: Option<String>,
    pub fields: FieldValues,
}

impl FieldRecord {
    pub fn new(filename: impl Into<String>, text: Option<String>, fields: FieldValues) -> Self {
        Self {
            filename: filename.into(),
            text,
            fields,
        }
    }

    /// Flatten into a JSON object with the reserved keys alongside the fields.
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        for (field, value) in self.fields.iter() {
            let v = value.map_or(serde_json::Value::Null, |s| serde_json::Value::String(s.to_string()));
            obj.insert(field.to_string(), v);
        }
        obj.insert(FILENAME_KEY.to_string(), serde_json::Value::String(self.filename.clone()));
        if let Some(text) = &self.text {
            obj.insert(TEXT_KEY.to_string(), serde_json::Value::String(text.clone()));
        }
        serde_json::Value::Object(obj)
    }
}

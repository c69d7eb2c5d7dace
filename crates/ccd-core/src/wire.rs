//! Parser for the vendor's pipe-delimited text responses.
//!
//! A response body is a header line followed by zero or more data lines, each
//! a `|`-separated list of values:
//!
//! ```text
//! user|full_name|status
//! agent001|Maria Garcia|INCALL
//! ```
//!
//! There is no escaping mechanism, so a literal `|` inside a value cannot be
//! represented on the wire.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use tracing::warn;

/// Separator between fields on every line of a response.
pub const FIELD_SEPARATOR: char = '|';

/// One data line of a response, keyed by the header row.
///
/// Fields keep the order of the header row. Lookups return the first field
/// with a matching name, so a duplicated header column resolves to its
/// leftmost value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field at the end of the record.
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.push((field.into(), value.into()));
    }

    /// Appends a field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    /// Returns the value of the first field named exactly `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(field, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Iterates over field names in header order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the values back into a single wire line.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = String::new();
        for (index, (_, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                line.push(FIELD_SEPARATOR);
            }
            line.push_str(value);
        }
        line
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

// Records serialize as JSON objects so that callers see `{"user": "..."}`
// rather than a list of pairs. Field order is preserved.
impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to string values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut record = Record::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    record.push(name, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// A parsed response: header fields plus one record per data line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Field names from the header line, in order.
    pub headers: Vec<String>,
    /// One record per data line, in input order.
    pub records: Vec<Record>,
    /// Number of data lines that carried more values than header fields.
    pub truncated_rows: usize,
}

/// Parses a response body into records, keeping input line order.
///
/// Never fails: an empty or whitespace-only body yields no records, a short
/// row fills its missing trailing fields with `""`, and values past the last
/// header field are dropped.
pub fn parse(body: &str) -> Vec<Record> {
    parse_table(body).records
}

/// Parses a response body and reports how many rows were truncated.
pub fn parse_table(body: &str) -> Table {
    let mut lines = body.lines().filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Table::default();
    };

    let headers: Vec<String> = header_line
        .split(FIELD_SEPARATOR)
        .map(str::to_owned)
        .collect();

    let mut records = Vec::new();
    let mut truncated_rows = 0;

    for (index, line) in lines.enumerate() {
        let mut values = line.split(FIELD_SEPARATOR);
        let record = headers
            .iter()
            .map(|name| (name.clone(), values.next().unwrap_or_default().to_owned()))
            .collect();

        let dropped = values.count();
        if dropped > 0 {
            truncated_rows += 1;
            warn!(
                row = index + 1,
                dropped,
                headers = headers.len(),
                "response row has more values than header fields, extra values dropped"
            );
        }

        records.push(record);
    }

    Table {
        headers,
        records,
        truncated_rows,
    }
}

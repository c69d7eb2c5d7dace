//! Declarative field mapping from wire records to typed records.
//!
//! Each typed record declares a table of [`FieldSpec`]s: one target field, the
//! vendor keys it may arrive under, and how its value is coerced. A single
//! generic [`project`] function applies any table to any [`Record`].
//!
//! Mapping is pure and total. A missing key, an unparseable number or an
//! unknown status code never fails; it yields the coercion's default (`""`,
//! `0`, `0.0`, or the target enum's `Unknown` variant).
//!
//! # Key resolution
//!
//! The vendor capitalizes keys inconsistently (`calls_today`, `CallsToday`,
//! `Calls-Today`). For each spec the first source key with an exact match
//! wins. Failing that, keys are compared after normalization: ASCII
//! lowercase, surrounding whitespace trimmed, and `_`, `-` and spaces removed.

use crate::wire::Record;

/// How a raw wire value is converted into a typed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerce {
    /// String passthrough. Defaults to `""`.
    Text,
    /// Integer, accepting decimals truncated toward zero. Defaults to `0`.
    Int,
    /// Finite decimal number. Defaults to `0.0`.
    Decimal,
    /// Raw status code, trimmed, interpreted by the target enum.
    Status,
}

/// Maps one target field from one or more accepted vendor keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub target: &'static str,
    pub sources: &'static [&'static str],
    pub coerce: Coerce,
}

impl FieldSpec {
    pub const fn text(target: &'static str, sources: &'static [&'static str]) -> Self {
        Self {
            target,
            sources,
            coerce: Coerce::Text,
        }
    }

    pub const fn int(target: &'static str, sources: &'static [&'static str]) -> Self {
        Self {
            target,
            sources,
            coerce: Coerce::Int,
        }
    }

    pub const fn decimal(target: &'static str, sources: &'static [&'static str]) -> Self {
        Self {
            target,
            sources,
            coerce: Coerce::Decimal,
        }
    }

    pub const fn status(target: &'static str, sources: &'static [&'static str]) -> Self {
        Self {
            target,
            sources,
            coerce: Coerce::Status,
        }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Decimal(f64),
    Status(String),
}

/// The result of applying a mapping table to a record.
///
/// Accessors never fail: asking for a target that is absent, or asking for it
/// with a different type than it was coerced to, returns that type's default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    values: Vec<(&'static str, FieldValue)>,
}

impl Projection {
    fn value(&self, target: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == target)
            .map(|(_, value)| value)
    }

    /// Returns a text or status field.
    pub fn text(&self, target: &str) -> String {
        match self.value(target) {
            Some(FieldValue::Text(value) | FieldValue::Status(value)) => value.clone(),
            _ => String::new(),
        }
    }

    /// Returns an integer field.
    pub fn int(&self, target: &str) -> i64 {
        match self.value(target) {
            Some(FieldValue::Int(value)) => *value,
            _ => 0,
        }
    }

    /// Returns a decimal field.
    pub fn decimal(&self, target: &str) -> f64 {
        match self.value(target) {
            Some(FieldValue::Decimal(value)) => *value,
            _ => 0.0,
        }
    }

    /// Returns a status field interpreted by `S`.
    pub fn status<S: for<'a> From<&'a str>>(&self, target: &str) -> S {
        S::from(self.text(target).as_str())
    }
}

/// Applies a mapping table to a record.
pub fn project(record: &Record, table: &[FieldSpec]) -> Projection {
    let values = table
        .iter()
        .map(|spec| {
            let raw = lookup(record, spec.sources).unwrap_or_default();
            let value = match spec.coerce {
                Coerce::Text => FieldValue::Text(raw.to_owned()),
                Coerce::Int => FieldValue::Int(coerce_int(raw)),
                Coerce::Decimal => FieldValue::Decimal(coerce_decimal(raw)),
                Coerce::Status => FieldValue::Status(raw.trim().to_owned()),
            };
            (spec.target, value)
        })
        .collect();

    Projection { values }
}

/// Returns the fields of `record` that no spec in `table` consumed.
pub fn unmapped(record: &Record, table: &[FieldSpec]) -> Record {
    let consumed: Vec<String> = table
        .iter()
        .flat_map(|spec| spec.sources.iter().map(|key| normalize_key(key)))
        .collect();

    record
        .iter()
        .filter(|(name, _)| !consumed.contains(&normalize_key(name)))
        .collect()
}

/// Finds the raw value for the first matching source key.
pub fn lookup<'r>(record: &'r Record, sources: &[&str]) -> Option<&'r str> {
    if let Some(value) = sources.iter().find_map(|key| record.get(key)) {
        return Some(value);
    }

    sources.iter().find_map(|key| {
        let wanted = normalize_key(key);
        record
            .iter()
            .find(|(name, _)| normalize_key(name) == wanted)
            .map(|(_, value)| value)
    })
}

/// Normalizes a vendor key for case- and separator-insensitive comparison.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parses an integer, falling back to a truncated decimal, then to `0`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate, and truncation toward zero is the intended coercion"
)]
pub fn coerce_int(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// Parses a finite decimal, falling back to `0.0`.
pub fn coerce_decimal(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// A typed record built from a wire [`Record`] through a mapping table.
pub trait FromRecord: Sized {
    /// The mapping table for this type.
    const FIELDS: &'static [FieldSpec];

    /// Builds the typed record from an already projected record.
    fn from_projection(projection: &Projection) -> Self;

    fn from_record(record: &Record) -> Self {
        Self::from_projection(&project(record, Self::FIELDS))
    }

    fn from_records(records: &[Record]) -> Vec<Self> {
        records.iter().map(Self::from_record).collect()
    }
}

//! Ready-made projectors over [`SourceRecord`]s.
//!
//! Attribute lookups take the historical key spellings in order; the first
//! one present wins, as with [`asadm_types::Attr`].

use super::decl::{ProjectionError, SourceRecord};
use asadm_types::{Scalar, ValueCell};
use serde_json::Value;

type Projected = Result<Scalar, ProjectionError>;

/// The map a source reported for this record, or why there is none. A lone
/// `{"error": ...}` entry is a failed fetch of that sub-entry.
fn source_map<'a>(record: &'a SourceRecord, source: &str) -> Result<&'a serde_json::Map<String, Value>, ProjectionError> {
    match record.get(source) {
        ValueCell::Value(Value::Object(map)) => match (map.len(), map.get("error")) {
            (1, Some(Value::String(cause))) => Err(ProjectionError::Fault(cause.clone())),
            _ => Ok(map),
        },
        ValueCell::Value(_) => Err(ProjectionError::Fault(format!("{} is not a map", source))),
        ValueCell::Absent => Err(ProjectionError::NoEntry),
        ValueCell::Error(cause) => Err(ProjectionError::Fault(cause)),
    }
}

fn lookup<'a>(record: &'a SourceRecord, source: &str, keys: &[&str]) -> Result<&'a Value, ProjectionError> {
    let map = source_map(record, source)?;
    keys.iter()
        .find_map(|key| map.get(*key))
        .filter(|value| !value.is_null())
        .ok_or(ProjectionError::NoEntry)
}

fn to_number(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Scalar::Int)
                .or_else(|_| s.parse::<f64>().map(Scalar::Float))
                .ok()
        }
        Value::Bool(b) => Some(Scalar::Int(*b as i64)),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

/// A numeric attribute.
pub fn number(
    source: &'static str,
    keys: &'static [&'static str],
) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| number_at(record, source, keys)
}

/// Read a numeric attribute directly, for projectors built around keys
/// only known at run time.
pub fn number_at(record: &SourceRecord, source: &str, keys: &[&str]) -> Projected {
    let value = lookup(record, source, keys)?;
    to_number(value).ok_or_else(|| ProjectionError::Fault(format!("{} is not a number", value)))
}

/// A string attribute; numbers and booleans are shown as written.
pub fn string(
    source: &'static str,
    keys: &'static [&'static str],
) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| match lookup(record, source, keys)? {
        Value::String(s) => Ok(Scalar::Str(s.clone())),
        Value::Number(n) => Ok(Scalar::Str(n.to_string())),
        Value::Bool(b) => Ok(Scalar::Str(b.to_string())),
        other => Err(ProjectionError::Fault(format!("{} is not a string", other))),
    }
}

pub fn boolean(
    source: &'static str,
    keys: &'static [&'static str],
) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| {
        let value = lookup(record, source, keys)?;
        to_bool(value)
            .map(Scalar::Bool)
            .ok_or_else(|| ProjectionError::Fault(format!("{} is not a boolean", value)))
    }
}

/// The whole entry a source reported, when it is a scalar.
pub fn entry(source: &'static str) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| match record.get(source) {
        ValueCell::Value(value) => Scalar::from_json(value)
            .ok_or_else(|| ProjectionError::Fault(format!("{} is not a scalar", source))),
        ValueCell::Absent => Err(ProjectionError::NoEntry),
        ValueCell::Error(cause) => Err(ProjectionError::Fault(cause)),
    }
}

/// The key of the sub-entry a for-each source is bound to.
pub fn each_key(source: &'static str) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| match record.each_key(source) {
        Some(key) => Ok(Scalar::from(key)),
        None => match record.get(source) {
            ValueCell::Error(cause) => Err(ProjectionError::Fault(cause)),
            _ => Err(ProjectionError::NoEntry),
        },
    }
}

/// The row key the record was merged under.
pub fn row_key() -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    |record| Ok(Scalar::from(record.row_key()))
}

/// `part / total * 100`. A zero total has no percentage.
pub fn percent<P, T>(part: P, total: T) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static
where
    P: Fn(&SourceRecord) -> Projected + Send + Sync + 'static,
    T: Fn(&SourceRecord) -> Projected + Send + Sync + 'static,
{
    move |record| {
        let part = numeric(part(record)?)?;
        let total = numeric(total(record)?)?;
        if total == 0.0 {
            return Err(ProjectionError::NoEntry);
        }
        Ok(Scalar::Float(part / total * 100.0))
    }
}

/// The first projector that yields a value. Faults stop the search.
pub fn first_of(
    projectors: Vec<Box<dyn Fn(&SourceRecord) -> Projected + Send + Sync>>,
) -> impl Fn(&SourceRecord) -> Projected + Send + Sync + 'static {
    move |record| {
        for projector in &projectors {
            match projector(record) {
                Err(ProjectionError::NoEntry) => continue,
                other => return other,
            }
        }
        Err(ProjectionError::NoEntry)
    }
}

fn numeric(value: Scalar) -> Result<f64, ProjectionError> {
    value
        .as_f64()
        .ok_or_else(|| ProjectionError::Fault(format!("{} is not a number", value)))
}

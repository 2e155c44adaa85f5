use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// One data point for one (field, record) pair.
///
/// `Absent` means the source simply had nothing for this record (a node that
/// does not carry the namespace, a stat that does not exist on that server
/// version). `Error` means the source faulted and carries the cause.
///
/// Ordering puts every `Value` before `Absent`, and `Absent` before `Error`,
/// so sorting a column keeps real data first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueCell<T> {
    Value(T),
    Absent,
    Error(String),
}

impl<T> ValueCell<T> {
    pub fn error(cause: impl Into<String>) -> Self {
        ValueCell::Error(cause.into())
    }

    pub fn is_value(&self) -> bool {
        matches!(self, ValueCell::Value(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ValueCell::Absent)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValueCell::Error(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ValueCell::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            ValueCell::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> ValueCell<&T> {
        match self {
            ValueCell::Value(v) => ValueCell::Value(v),
            ValueCell::Absent => ValueCell::Absent,
            ValueCell::Error(cause) => ValueCell::Error(cause.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ValueCell<U> {
        match self {
            ValueCell::Value(v) => ValueCell::Value(f(v)),
            ValueCell::Absent => ValueCell::Absent,
            ValueCell::Error(cause) => ValueCell::Error(cause),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> ValueCell<U>) -> ValueCell<U> {
        match self {
            ValueCell::Value(v) => f(v),
            ValueCell::Absent => ValueCell::Absent,
            ValueCell::Error(cause) => ValueCell::Error(cause),
        }
    }
}

impl<T> From<Option<T>> for ValueCell<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => ValueCell::Value(v),
            None => ValueCell::Absent,
        }
    }
}

// Absent serializes as null and errors as {"error": cause}, which keeps JSON
// output readable by the same tools that read the info protocol dumps.
impl<T: Serialize> Serialize for ValueCell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValueCell::Value(v) => v.serialize(serializer),
            ValueCell::Absent => serializer.serialize_none(),
            ValueCell::Error(cause) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", cause)?;
                map.end()
            }
        }
    }
}

/// A projected, displayable scalar.
///
/// Numbers compare numerically across `Int` and `Float`; different kinds
/// order as `Bool < number < Str`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// Interpret a raw JSON value as a scalar. Arrays and objects have no
    /// scalar reading.
    pub fn from_json(value: &Value) -> Option<Scalar> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::String(s) => Some(Scalar::Str(s.clone())),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Bool(_) => 0,
            Scalar::Int(_) | Scalar::Float(_) => 1,
            Scalar::Str(_) => 2,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)),
            (Scalar::Int(a), Scalar::Float(b)) => cmp_int_float(*a, *b),
            (Scalar::Float(a), Scalar::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

// Exact, so that ordering stays transitive for integers beyond 2^53. NaN
// sorts the way `f64::total_cmp` places it.
fn cmp_int_float(int: i64, float: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= TWO_POW_63 {
        return Ordering::Less;
    }
    if float < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    int.cmp(&(whole as i64))
        .then_with(|| 0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal))
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<usize> for Scalar {
    fn from(v: usize) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

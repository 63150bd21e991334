use ordered_float::OrderedFloat;
use std::fmt;
use std::sync::Arc;

/// Declared type of a column in a row signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Long,
    Float,
    Double,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
        };
        f.write_str(name)
    }
}

/// A raw value as produced by a row adapter, before conversion to a column's declared type.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts to a long. Floats truncate toward zero; strings must spell an exact integer
    /// (`"12"`, `"12.0"` and `"1.2e1"` all qualify, `"12.5"` does not).
    pub fn to_long(&self) -> Option<i64> {
        match self {
            Self::Null => None,
            Self::Long(v) => Some(*v),
            Self::Float(v) => float_to_long(f64::from(*v)),
            Self::Double(v) => float_to_long(*v),
            Self::String(s) => {
                if let Ok(v) = s.parse::<i64>() {
                    return Some(v);
                }
                s.parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0)
                    .and_then(float_to_long)
            }
        }
    }

    pub fn to_double(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::String(s) => s.parse::<f64>().ok(),
        }
    }

    pub fn to_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::String(s) => s.parse::<f32>().ok(),
            other => other.to_double().map(|v| v as f32),
        }
    }

    /// Converts to a string. Empty strings count as null.
    pub fn to_string_value(&self) -> Option<Arc<str>> {
        let s: Arc<str> = match self {
            Self::Null => return None,
            Self::String(s) => s.clone(),
            Self::Long(v) => Arc::from(v.to_string()),
            Self::Float(v) => Arc::from(v.to_string()),
            Self::Double(v) => Arc::from(v.to_string()),
        };
        (!s.is_empty()).then_some(s)
    }
}

fn float_to_long(v: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or past it does not fit.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (v.is_finite() && v >= -LIMIT && v < LIMIT).then(|| v.trunc() as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Long(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(Arc::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Hashable key for non-long indexes, normalized to the column's declared type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ObjectKey {
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(Arc<str>),
}

impl ObjectKey {
    pub fn convert(value: &Value, value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Float => value.to_float().map(|v| Self::Float(OrderedFloat(v))),
            ValueType::Double => value.to_double().map(|v| Self::Double(OrderedFloat(v))),
            ValueType::String => value.to_string_value().map(Self::String),
            ValueType::Long => value.to_long().map(Self::Long),
        }
    }
}

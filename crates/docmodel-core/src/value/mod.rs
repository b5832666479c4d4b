mod json;

#[cfg(test)]
mod tests;

use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt};
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

// re-exports
pub use json::attributes_from_json;

///
/// AttributeMap
///
/// The canonical name → value mapping. Every external input is normalized
/// into this shape at the boundary; comparisons are order-insensitive.
///

pub type AttributeMap = BTreeMap<String, Value>;

///
/// Value
///
/// Null        → nothing stored; omitted from exported mappings.
/// Map         → nested mapping, also the export shape of embedded documents.
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum Value {
    Bool(bool),
    Date(Date),
    Float(f64),
    Int(i64),
    List(Vec<Self>),
    Map(AttributeMap),
    Null,
    Text(String),
    Timestamp(OffsetDateTime),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short label for the variant, used in coercion errors and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Date(_) => "date",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

// RFC 3339 only covers four-digit years; anything else falls back to the
// `time` display form.
pub(crate) fn format_timestamp(ts: &OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (name, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Null => f.write_str("nil"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Timestamp(v) => f.write_str(&format_timestamp(v)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Date(v) => serializer.collect_str(v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
            Self::Null => serializer.serialize_unit(),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Timestamp(v) => serializer.serialize_str(&format_timestamp(v)),
        }
    }
}

//
// From impls
//

macro_rules! impl_value_from {
    ( $( $ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    Date => Date,
    f64 => Float,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    String => Text,
    &str => Text,
    OffsetDateTime => Timestamp,
    Vec<Value> => List,
    AttributeMap => Map,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

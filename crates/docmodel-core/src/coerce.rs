//! Type coercion contract and the default native coercer.
//!
//! A coercer turns a raw assigned value into the typed value stored for a
//! key (`set`), and re-derives the value handed out on read (`get`). Both
//! directions must be pure and deterministic per input, and `get ∘ set`
//! must be idempotent.

use crate::value::{Value, format_timestamp};
use docmodel_schema::types::Primitive;
use thiserror::Error as ThisError;
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

///
/// CoercionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CoercionError {
    #[error("cannot coerce {found} value {value} into {target}")]
    Unsupported {
        target: String,
        found: &'static str,
        value: String,
    },

    #[error("invalid {target} value {value}: {reason}")]
    Invalid {
        target: String,
        value: String,
        reason: String,
    },
}

impl CoercionError {
    pub(crate) fn unsupported(target: impl ToString, value: &Value) -> Self {
        Self::Unsupported {
            target: target.to_string(),
            found: value.kind(),
            value: value.to_string(),
        }
    }

    pub(crate) fn invalid(target: impl ToString, value: &Value, reason: impl ToString) -> Self {
        Self::Invalid {
            target: target.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

///
/// Coercer
///
/// Injected per model. Implementations must not panic on present but
/// unsupported values; they return `CoercionError` instead.
///

pub trait Coercer: Send + Sync {
    /// Raw input → stored typed value. Used on write.
    fn set(&self, primitive: Primitive, raw: &Value) -> Result<Value, CoercionError>;

    /// Stored typed value → value handed to readers.
    fn get(&self, primitive: Primitive, stored: &Value) -> Value {
        let _ = primitive;
        stored.clone()
    }
}

///
/// NativeCoercer
///
/// Default coercion rules for the built-in primitives. `Null` passes through
/// every primitive untouched.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NativeCoercer;

impl Coercer for NativeCoercer {
    fn set(&self, primitive: Primitive, raw: &Value) -> Result<Value, CoercionError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        match primitive {
            Primitive::Bool => to_bool(raw),
            Primitive::Date => to_date(raw),
            Primitive::Float => to_float(raw),
            Primitive::Int => to_int(raw),
            Primitive::List => Ok(to_list(raw)),
            Primitive::Map => to_map(raw),
            Primitive::Text => to_text(raw),
            Primitive::Timestamp => to_timestamp(raw),
        }
    }

    // timestamps are always handed out in UTC
    fn get(&self, _primitive: Primitive, stored: &Value) -> Value {
        match stored {
            Value::Timestamp(ts) => Value::Timestamp(ts.to_offset(UtcOffset::UTC)),
            other => other.clone(),
        }
    }
}

fn to_bool(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Bool(v) => Ok(Value::Bool(*v)),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "no" | "n" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(CoercionError::invalid(Primitive::Bool, raw, "not a boolean")),
        },
        _ => Err(CoercionError::unsupported(Primitive::Bool, raw)),
    }
}

fn to_date(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::Timestamp(ts) => Ok(Value::Date(ts.to_offset(UtcOffset::UTC).date())),
        Value::Text(s) => {
            let s = s.trim();
            Date::parse(s, format_description!("[year]-[month]-[day]"))
                .or_else(|_| OffsetDateTime::parse(s, &Rfc3339).map(|ts| ts.date()))
                .map(Value::Date)
                .map_err(|err| CoercionError::invalid(Primitive::Date, raw, err))
        }
        _ => Err(CoercionError::unsupported(Primitive::Date, raw)),
    }
}

fn to_float(raw: &Value) -> Result<Value, CoercionError> {
    let v = match raw {
        Value::Float(v) => *v,
        #[expect(clippy::cast_precision_loss)]
        Value::Int(v) => *v as f64,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|err| CoercionError::invalid(Primitive::Float, raw, err))?,
        _ => return Err(CoercionError::unsupported(Primitive::Float, raw)),
    };

    if v.is_finite() {
        Ok(Value::Float(v))
    } else {
        Err(CoercionError::invalid(Primitive::Float, raw, "not finite"))
    }
}

// i64 bounds as f64; the upper bound itself is not representable as i64
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

fn to_int(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Int(v) => Ok(Value::Int(*v)),
        Value::Float(v) => {
            let truncated = v.trunc();
            if truncated.is_finite() && (I64_MIN_F64..I64_END_F64).contains(&truncated) {
                #[expect(clippy::cast_possible_truncation)]
                let int = truncated as i64;
                Ok(Value::Int(int))
            } else {
                Err(CoercionError::invalid(Primitive::Int, raw, "out of range"))
            }
        }
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| CoercionError::invalid(Primitive::Int, raw, err)),
        _ => Err(CoercionError::unsupported(Primitive::Int, raw)),
    }
}

fn to_list(raw: &Value) -> Value {
    match raw {
        Value::List(items) => Value::List(items.clone()),
        other => Value::List(vec![other.clone()]),
    }
}

fn to_map(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Map(map) => Ok(Value::Map(map.clone())),
        _ => Err(CoercionError::unsupported(Primitive::Map, raw)),
    }
}

fn to_text(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Text(s) => Ok(Value::Text(s.clone())),
        Value::Bool(v) => Ok(Value::Text(v.to_string())),
        Value::Int(v) => Ok(Value::Text(v.to_string())),
        Value::Float(v) => Ok(Value::Text(v.to_string())),
        Value::Date(d) => Ok(Value::Text(d.to_string())),
        Value::Timestamp(ts) => Ok(Value::Text(format_timestamp(ts))),
        _ => Err(CoercionError::unsupported(Primitive::Text, raw)),
    }
}

fn to_timestamp(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
        Value::Date(d) => Ok(Value::Timestamp(d.midnight().assume_utc())),
        Value::Int(secs) => OffsetDateTime::from_unix_timestamp(*secs)
            .map(Value::Timestamp)
            .map_err(|err| CoercionError::invalid(Primitive::Timestamp, raw, err)),
        Value::Text(s) => OffsetDateTime::parse(s.trim(), &Rfc3339)
            .map(Value::Timestamp)
            .map_err(|err| CoercionError::invalid(Primitive::Timestamp, raw, err)),
        _ => Err(CoercionError::unsupported(Primitive::Timestamp, raw)),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    fn set(primitive: Primitive, raw: impl Into<Value>) -> Result<Value, CoercionError> {
        NativeCoercer.set(primitive, &raw.into())
    }

    #[test]
    fn null_passes_through_every_primitive() {
        for primitive in [Primitive::Bool, Primitive::Int, Primitive::Map, Primitive::Text] {
            assert_eq!(set(primitive, Value::Null), Ok(Value::Null));
        }
    }

    #[test]
    fn int_parses_numeric_text_and_rejects_garbage() {
        assert_eq!(set(Primitive::Int, "17"), Ok(Value::Int(17)));
        assert_eq!(set(Primitive::Int, " -4 "), Ok(Value::Int(-4)));
        assert_eq!(set(Primitive::Int, 3.9), Ok(Value::Int(3)));

        let err = set(Primitive::Int, "abc").expect_err("garbage should not coerce");
        assert!(matches!(err, CoercionError::Invalid { ref target, .. } if target == "Int"));

        assert!(matches!(
            set(Primitive::Int, true),
            Err(CoercionError::Unsupported { found: "bool", .. })
        ));
        assert!(set(Primitive::Int, 1e300).is_err());
    }

    #[test]
    fn float_rejects_non_finite_text() {
        assert_eq!(set(Primitive::Float, "2.5"), Ok(Value::Float(2.5)));
        assert_eq!(set(Primitive::Float, 2_i64), Ok(Value::Float(2.0)));
        assert!(set(Primitive::Float, "NaN").is_err());
        assert!(set(Primitive::Float, "inf").is_err());
    }

    #[test]
    fn bool_accepts_common_spellings() {
        assert_eq!(set(Primitive::Bool, "Yes"), Ok(Value::Bool(true)));
        assert_eq!(set(Primitive::Bool, "0"), Ok(Value::Bool(false)));
        assert_eq!(set(Primitive::Bool, 1_i64), Ok(Value::Bool(true)));
        assert!(set(Primitive::Bool, "maybe").is_err());
        assert!(set(Primitive::Bool, 2_i64).is_err());
    }

    #[test]
    fn text_stringifies_scalars_only() {
        assert_eq!(set(Primitive::Text, 42_i64), Ok(Value::Text("42".into())));
        assert_eq!(set(Primitive::Text, false), Ok(Value::Text("false".into())));
        assert!(set(Primitive::Text, Value::List(vec![])).is_err());
    }

    #[test]
    fn temporal_values_parse_from_text() {
        assert_eq!(
            set(Primitive::Date, "2024-02-29"),
            Ok(Value::Date(date!(2024 - 02 - 29)))
        );
        assert_eq!(
            set(Primitive::Date, "2024-02-29T23:00:00Z"),
            Ok(Value::Date(date!(2024 - 02 - 29)))
        );
        assert_eq!(
            set(Primitive::Timestamp, 0_i64),
            Ok(Value::Timestamp(datetime!(1970-01-01 0:00 UTC)))
        );
        assert_eq!(
            set(Primitive::Timestamp, Value::Date(date!(2020 - 01 - 01))),
            Ok(Value::Timestamp(datetime!(2020-01-01 0:00 UTC)))
        );
        assert!(set(Primitive::Date, "2024-02-30").is_err());
    }

    #[test]
    fn get_normalizes_timestamps_to_utc() {
        let stored = Value::Timestamp(datetime!(2024-01-01 10:00 +02:00));
        let read = NativeCoercer.get(Primitive::Timestamp, &stored);

        let Value::Timestamp(ts) = read else {
            panic!("timestamp read should stay a timestamp");
        };
        assert_eq!(ts.offset(), UtcOffset::UTC);
        assert_eq!(ts, datetime!(2024-01-01 8:00 UTC));
    }

    #[test]
    fn list_wraps_scalars() {
        assert_eq!(
            set(Primitive::List, "a"),
            Ok(Value::List(vec![Value::Text("a".into())]))
        );
        assert!(set(Primitive::Map, "a").is_err());
    }

    proptest! {
        #[test]
        fn int_get_after_set_is_idempotent(n in any::<i64>()) {
            let once = NativeCoercer.set(Primitive::Int, &Value::Text(n.to_string())).unwrap();
            let read = NativeCoercer.get(Primitive::Int, &once);
            let again = NativeCoercer.set(Primitive::Int, &read).unwrap();

            prop_assert_eq!(once, Value::Int(n));
            prop_assert_eq!(NativeCoercer.get(Primitive::Int, &again), read);
        }

        #[test]
        fn text_coercion_is_identity_on_text(s in ".*") {
            let typed = NativeCoercer.set(Primitive::Text, &Value::Text(s.clone())).unwrap();
            prop_assert_eq!(typed, Value::Text(s));
        }
    }
}

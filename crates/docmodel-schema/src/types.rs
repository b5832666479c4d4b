use crate::prelude::*;
use derive_more::{Display, FromStr};

///
/// Cardinality
///

#[derive(Clone, Copy, Default, Debug, Deserialize, Display, Eq, FromStr, PartialEq, Serialize)]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

impl Cardinality {
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }
}

///
/// Primitive
///
/// Declared scalar (native) key types. A key whose type is not a primitive
/// names another document model instead.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum Primitive {
    Bool,
    Date,
    Float,
    Int,
    List,
    Map,
    Text,
    Timestamp,
}

impl Primitive {
    /// Integer primitives restrict numericality checks to whole numbers.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_round_trips_through_from_str() {
        for primitive in [
            Primitive::Bool,
            Primitive::Date,
            Primitive::Float,
            Primitive::Int,
            Primitive::List,
            Primitive::Map,
            Primitive::Text,
            Primitive::Timestamp,
        ] {
            let parsed: Primitive = primitive.to_string().parse().expect("primitive should parse");
            assert_eq!(parsed, primitive);
        }
    }

    #[test]
    fn unknown_primitive_names_do_not_parse() {
        assert!("Address".parse::<Primitive>().is_err());
    }

    #[test]
    fn only_int_is_integer() {
        assert!(Primitive::Int.is_int());
        assert!(!Primitive::Float.is_int());
    }
}

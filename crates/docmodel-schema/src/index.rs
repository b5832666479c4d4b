use crate::prelude::*;
use derive_more::Display;
use std::{fmt, ops::Not};

///
/// IndexDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexDirection {
    #[default]
    #[display("ASC")]
    Ascending,
    #[display("DESC")]
    Descending,
}

///
/// IndexRequest
///
/// Index the persistence layer should create. Field order is significant.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexRequest {
    pub fields: Vec<(String, IndexDirection)>,

    #[serde(default, skip_serializing_if = "Not::not")]
    pub unique: bool,
}

impl IndexRequest {
    #[must_use]
    pub fn single(field: impl Into<String>, unique: bool) -> Self {
        Self {
            fields: vec![(field.into(), IndexDirection::Ascending)],
            unique,
        }
    }
}

impl fmt::Display for IndexRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|(name, direction)| format!("{name} {direction}"))
            .collect::<Vec<_>>()
            .join(", ");

        if self.unique {
            write!(f, "UNIQUE ({fields})")
        } else {
            write!(f, "({fields})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_index_renders_directions() {
        let single = IndexRequest::single("a", false);
        let compound = IndexRequest {
            fields: vec![
                ("a".to_string(), IndexDirection::Ascending),
                ("b".to_string(), IndexDirection::Descending),
            ],
            unique: false,
        };

        assert_eq!(single.to_string(), "(a ASC)");
        assert_eq!(compound.to_string(), "(a ASC, b DESC)");
    }
}

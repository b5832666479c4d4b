use crate::prelude::*;
use std::{
    fmt::{self, Display},
    ops::RangeInclusive,
};

///
/// ValidationRequest
///
/// One rule an external validation engine should attach to an attribute.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ValidationRequest {
    pub attribute: String,

    #[serde(flatten)]
    pub rule: ValidationRule,
}

impl ValidationRequest {
    #[must_use]
    pub fn new(attribute: impl Into<String>, rule: ValidationRule) -> Self {
        Self {
            attribute: attribute.into(),
            rule,
        }
    }
}

impl Display for ValidationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.rule)
    }
}

///
/// ValidationRule
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "rule", content = "params", rename_all = "snake_case")]
pub enum ValidationRule {
    Presence,
    Uniqueness,
    Numericality { only_integers: bool },
    Format { pattern: String },
    Length(LengthBound),
}

impl ValidationRule {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Uniqueness => "uniqueness",
            Self::Numericality { .. } => "numericality",
            Self::Format { .. } => "format",
            Self::Length(_) => "length",
        }
    }
}

impl Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence | Self::Uniqueness => f.write_str(self.name()),
            Self::Numericality { only_integers } => {
                write!(f, "numericality (only_integers: {only_integers})")
            }
            Self::Format { pattern } => write!(f, "format /{pattern}/"),
            Self::Length(bound) => write!(f, "length {bound}"),
        }
    }
}

///
/// LengthBound
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBound {
    MinMax {
        min: Option<usize>,
        max: Option<usize>,
    },
    Within(RangeInclusive<usize>),
}

impl Display for LengthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinMax { min, max } => {
                f.write_str("{")?;
                if let Some(min) = min {
                    write!(f, "min: {min}")?;
                }
                if let Some(max) = max {
                    if min.is_some() {
                        f.write_str(", ")?;
                    }
                    write!(f, "max: {max}")?;
                }
                f.write_str("}")
            }
            Self::Within(range) => write!(f, "{{within: {}..={}}}", range.start(), range.end()),
        }
    }
}

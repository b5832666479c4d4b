use crate::{
    index::IndexRequest,
    prelude::*,
    rule::{LengthBound, ValidationRequest, ValidationRule},
};
use std::{ops::RangeInclusive, ops::Not};

///
/// KeyOptions
///
/// Options recognised on a key declaration. Unset flags derive nothing.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyOptions {
    #[serde(skip_serializing_if = "Not::not")]
    pub required: bool,

    #[serde(skip_serializing_if = "Not::not")]
    pub unique: bool,

    #[serde(skip_serializing_if = "Not::not")]
    pub numeric: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthOption>,

    #[serde(skip_serializing_if = "Not::not")]
    pub index: bool,
}

impl KeyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    #[must_use]
    pub fn format(mut self, pattern: impl Into<String>) -> Self {
        self.format = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn length(mut self, length: impl Into<LengthOption>) -> Self {
        self.length = Some(length.into());
        self
    }

    #[must_use]
    pub const fn index(mut self) -> Self {
        self.index = true;
        self
    }

    ///
    /// Derive the validation requests these options ask for, in a fixed
    /// order: presence, uniqueness, numericality, format, length.
    ///
    pub fn validation_requests(
        &self,
        attribute: &str,
        only_integers: bool,
    ) -> Result<Vec<ValidationRequest>, SchemaError> {
        let mut rules = Vec::new();

        if self.required {
            rules.push(ValidationRule::Presence);
        }
        if self.unique {
            rules.push(ValidationRule::Uniqueness);
        }
        if self.numeric {
            rules.push(ValidationRule::Numericality { only_integers });
        }
        if let Some(pattern) = &self.format {
            rules.push(ValidationRule::Format {
                pattern: pattern.clone(),
            });
        }
        if let Some(length) = &self.length {
            rules.push(ValidationRule::Length(length.bound(attribute)?));
        }

        Ok(rules
            .into_iter()
            .map(|rule| ValidationRequest::new(attribute, rule))
            .collect())
    }

    /// Single-field ascending index request when `index` is set.
    #[must_use]
    pub fn index_request(&self, attribute: &str) -> Option<IndexRequest> {
        self.index
            .then(|| IndexRequest::single(attribute, self.unique))
    }
}

///
/// LengthOption
///
/// Accepted shapes for the `length` option: an exact count, an inclusive
/// range written as `{ start, end }`, or a `{ min, max }` bound object.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LengthOption {
    Exact(usize),
    Range(RangeInclusive<usize>),
    Bounds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
}

impl LengthOption {
    #[must_use]
    pub const fn bounds(min: Option<usize>, max: Option<usize>) -> Self {
        Self::Bounds { min, max }
    }

    /// Translate into the bound handed to the validation engine.
    pub fn bound(&self, attribute: &str) -> Result<LengthBound, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidLengthSpec {
            attribute: attribute.to_string(),
            reason,
        };

        match self {
            Self::Exact(count) => Ok(LengthBound::MinMax {
                min: Some(0),
                max: Some(*count),
            }),
            Self::Range(range) => {
                if range.start() > range.end() {
                    return Err(invalid(format!(
                        "range {}..={} is empty",
                        range.start(),
                        range.end()
                    )));
                }

                Ok(LengthBound::Within(range.clone()))
            }
            Self::Bounds { min: None, max: None } => {
                Err(invalid("bound object needs min or max".to_string()))
            }
            Self::Bounds {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(invalid(format!("min {min} exceeds max {max}"))),
            Self::Bounds { min, max } => Ok(LengthBound::MinMax {
                min: *min,
                max: *max,
            }),
        }
    }
}

impl From<usize> for LengthOption {
    fn from(count: usize) -> Self {
        Self::Exact(count)
    }
}

impl From<RangeInclusive<usize>> for LengthOption {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::Range(range)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(options: &KeyOptions, only_integers: bool) -> Vec<ValidationRule> {
        options
            .validation_requests("field", only_integers)
            .expect("options should be valid")
            .into_iter()
            .map(|request| request.rule)
            .collect()
    }

    #[test]
    fn empty_options_derive_nothing() {
        assert!(rules(&KeyOptions::new(), false).is_empty());
        assert!(KeyOptions::new().index_request("field").is_none());
    }

    #[test]
    fn flags_derive_rules_in_declaration_order() {
        let options = KeyOptions::new()
            .length(3usize)
            .format("^[a-z]+$")
            .numeric()
            .unique()
            .required();

        assert_eq!(
            rules(&options, true),
            vec![
                ValidationRule::Presence,
                ValidationRule::Uniqueness,
                ValidationRule::Numericality {
                    only_integers: true
                },
                ValidationRule::Format {
                    pattern: "^[a-z]+$".to_string()
                },
                ValidationRule::Length(LengthBound::MinMax {
                    min: Some(0),
                    max: Some(3)
                }),
            ]
        );
    }

    #[test]
    fn numericality_follows_declared_type() {
        let options = KeyOptions::new().numeric();

        assert_eq!(
            rules(&options, false),
            vec![ValidationRule::Numericality {
                only_integers: false
            }]
        );
    }

    #[test]
    fn range_length_becomes_within() {
        let requests = KeyOptions::new()
            .length(2usize..=30)
            .validation_requests("name", false)
            .expect("range should be valid");

        assert_eq!(
            requests,
            vec![ValidationRequest::new(
                "name",
                ValidationRule::Length(LengthBound::Within(2..=30))
            )]
        );
    }

    #[test]
    fn bound_object_passes_through() {
        let bound = LengthOption::bounds(Some(4), None)
            .bound("code")
            .expect("min-only bound should be valid");

        assert_eq!(
            bound,
            LengthBound::MinMax {
                min: Some(4),
                max: None
            }
        );
    }

    #[test]
    fn invalid_length_shapes_are_rejected() {
        let empty_bounds = KeyOptions::new().length(LengthOption::bounds(None, None));
        let crossed_bounds = KeyOptions::new().length(LengthOption::bounds(Some(9), Some(2)));
        #[allow(clippy::reversed_empty_ranges)]
        let empty_range = KeyOptions::new().length(5usize..=1);

        for options in [empty_bounds, crossed_bounds, empty_range] {
            let err = options
                .validation_requests("name", false)
                .expect_err("length shape should be rejected");
            assert!(matches!(err, SchemaError::InvalidLengthSpec { ref attribute, .. } if attribute == "name"));
        }
    }

    #[test]
    fn index_request_carries_uniqueness() {
        let request = KeyOptions::new()
            .index()
            .unique()
            .index_request("email")
            .expect("index flag should produce a request");

        assert!(request.unique);
        assert_eq!(request.to_string(), "UNIQUE (email ASC)");
    }

    #[test]
    fn options_deserialize_from_toml_shapes() {
        let exact: KeyOptions = toml::from_str("length = 5").expect("exact length");
        assert_eq!(exact.length, Some(LengthOption::Exact(5)));

        let range: KeyOptions =
            toml::from_str("length = { start = 2, end = 30 }").expect("range length");
        assert_eq!(range.length, Some(LengthOption::Range(2..=30)));

        let bounds: KeyOptions =
            toml::from_str("required = true\nlength = { max = 8 }").expect("bound length");
        assert!(bounds.required);
        assert_eq!(bounds.length, Some(LengthOption::bounds(None, Some(8))));
    }

    #[test]
    fn unknown_option_names_are_rejected() {
        assert!(toml::from_str::<KeyOptions>("nullable = true").is_err());
    }
}

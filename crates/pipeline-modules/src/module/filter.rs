//! Op filters: predicates over processor class names that decide which
//! processors of a pipeline an op applies to.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Error raised when a filter cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Filter type enum.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpFilterType {
    /// Full-string regular expression match.
    Regex,
    /// Substring containment.
    Substr,
    /// Exact equality.
    Equal,
    /// Processors whose name does not match the regex.
    NotRegex,
    /// Processors whose name does not contain the substring.
    NotSubstr,
}

impl OpFilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "REGEX",
            Self::Substr => "SUBSTR",
            Self::Equal => "EQUAL",
            Self::NotRegex => "NOT_REGEX",
            Self::NotSubstr => "NOT_SUBSTR",
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, Self::NotRegex | Self::NotSubstr)
    }

    fn uses_regex(&self) -> bool {
        matches!(self, Self::Regex | Self::NotRegex)
    }
}

/// How the `NOT_*` filter types are evaluated.
///
/// `Negate` inverts the positive test. `Match` evaluates `NOT_REGEX` and
/// `NOT_SUBSTR` exactly like `REGEX` and `SUBSTR`, which is what module
/// catalogs written against older resolvers expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotFilterSemantics {
    #[default]
    Negate,
    Match,
}

/// Wire form of an [`OpFilter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpFilterSpec {
    #[serde(rename = "type")]
    pub filter_type: OpFilterType,
    #[serde(default)]
    pub processor: Option<String>,
}

/// Matches processor class names.
///
/// Regex filters are compiled once, when the filter is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "OpFilterSpec", into = "OpFilterSpec")]
pub struct OpFilter {
    filter_type: OpFilterType,
    processor: String,
    regex: Option<Regex>,
}

impl OpFilter {
    /// Build a filter, compiling the pattern for regex types.
    pub fn new(filter_type: OpFilterType, processor: impl Into<String>) -> Result<Self, FilterError> {
        let processor = processor.into();
        let regex = if filter_type.uses_regex() {
            let anchored = format!("^(?:{})$", processor);
            let compiled = Regex::new(&anchored).map_err(|e| FilterError::InvalidRegexPattern {
                pattern: processor.clone(),
                reason: e.to_string(),
            })?;
            Some(compiled)
        } else {
            None
        };

        Ok(Self {
            filter_type,
            processor,
            regex,
        })
    }

    pub fn equal(processor: impl Into<String>) -> Self {
        Self {
            filter_type: OpFilterType::Equal,
            processor: processor.into(),
            regex: None,
        }
    }

    pub fn substr(processor: impl Into<String>) -> Self {
        Self {
            filter_type: OpFilterType::Substr,
            processor: processor.into(),
            regex: None,
        }
    }

    pub fn filter_type(&self) -> OpFilterType {
        self.filter_type
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }

    /// Check whether a processor class name passes this filter.
    pub fn matches(&self, class_name: &str, semantics: NotFilterSemantics) -> bool {
        let positive = match self.filter_type {
            OpFilterType::Regex | OpFilterType::NotRegex => self
                .regex
                .as_ref()
                .is_some_and(|re| re.is_match(class_name)),
            OpFilterType::Substr | OpFilterType::NotSubstr => {
                class_name.contains(self.processor.as_str())
            }
            OpFilterType::Equal => class_name == self.processor,
        };

        if self.filter_type.is_negated() && semantics == NotFilterSemantics::Negate {
            !positive
        } else {
            positive
        }
    }
}

impl PartialEq for OpFilter {
    fn eq(&self, other: &Self) -> bool {
        self.filter_type == other.filter_type && self.processor == other.processor
    }
}

impl TryFrom<OpFilterSpec> for OpFilter {
    type Error = FilterError;

    fn try_from(spec: OpFilterSpec) -> Result<Self, Self::Error> {
        OpFilter::new(spec.filter_type, spec.processor.unwrap_or_default())
    }
}

impl From<OpFilter> for OpFilterSpec {
    fn from(filter: OpFilter) -> Self {
        Self {
            filter_type: filter.filter_type,
            processor: Some(filter.processor),
        }
    }
}

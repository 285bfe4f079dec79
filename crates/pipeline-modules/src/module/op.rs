//! Pipeline edit operations.
//!
//! An op pairs an action with an optional filter. The action payload is
//! decoded once, when the op is built from its wire form, into the shape its
//! type requires: a fragment of processors, a list of module names or an
//! argument map.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::filter::{FilterError, NotFilterSemantics, OpFilter, OpFilterSpec};
use crate::processor::{Args, ProcessorRef};

/// Types of operations a module can make.
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
pub enum ModOpType {
    /// Set arguments on the matched processor.
    SetArgs,
    /// Append processors to the end of the pipeline.
    Append,
    /// Insert processors at the prepend marker.
    Prepend,
    /// Add processors before the matched processor.
    AddBefore,
    /// Add processors after the matched processor.
    AddAfter,
    /// Replace the matched processor.
    Replace,
    /// Remove the matched processor.
    Remove,
    /// Append processors as far back as possible.
    Last,
    /// Append once and only once, merging args into an existing processor.
    AppendMerge,
    /// Apply dependent modules.
    Depend,
}

impl ModOpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetArgs => "SET_ARGS",
            Self::Append => "APPEND",
            Self::Prepend => "PREPEND",
            Self::AddBefore => "ADD_BEFORE",
            Self::AddAfter => "ADD_AFTER",
            Self::Replace => "REPLACE",
            Self::Remove => "REMOVE",
            Self::Last => "LAST",
            Self::AppendMerge => "APPEND_MERGE",
            Self::Depend => "DEPEND",
        }
    }
}

/// Error raised when an op's payload does not have the shape its type needs.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("expected {expected}: {source}")]
    Shape {
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// A decoded op action with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ModOpAction {
    AddBefore(Vec<ProcessorRef>),
    AddAfter(Vec<ProcessorRef>),
    Append(Vec<ProcessorRef>),
    AppendMerge(Vec<ProcessorRef>),
    Prepend(Vec<ProcessorRef>),
    Last(Vec<ProcessorRef>),
    Remove,
    Replace(Vec<ProcessorRef>),
    SetArgs(Args),
    Depend(Vec<String>),
}

impl ModOpAction {
    pub fn op_type(&self) -> ModOpType {
        match self {
            Self::AddBefore(_) => ModOpType::AddBefore,
            Self::AddAfter(_) => ModOpType::AddAfter,
            Self::Append(_) => ModOpType::Append,
            Self::AppendMerge(_) => ModOpType::AppendMerge,
            Self::Prepend(_) => ModOpType::Prepend,
            Self::Last(_) => ModOpType::Last,
            Self::Remove => ModOpType::Remove,
            Self::Replace(_) => ModOpType::Replace,
            Self::SetArgs(_) => ModOpType::SetArgs,
            Self::Depend(_) => ModOpType::Depend,
        }
    }

    /// Decode a raw payload for the given op type. A missing payload decodes
    /// to an empty one.
    pub fn decode(op_type: ModOpType, apply: Option<Value>) -> Result<Self, PayloadError> {
        let action = match op_type {
            ModOpType::AddBefore => Self::AddBefore(fragment(apply)?),
            ModOpType::AddAfter => Self::AddAfter(fragment(apply)?),
            ModOpType::Append => Self::Append(fragment(apply)?),
            ModOpType::AppendMerge => Self::AppendMerge(fragment(apply)?),
            ModOpType::Prepend => Self::Prepend(fragment(apply)?),
            ModOpType::Last => Self::Last(fragment(apply)?),
            ModOpType::Remove => Self::Remove,
            ModOpType::Replace => Self::Replace(fragment(apply)?),
            ModOpType::SetArgs => Self::SetArgs(decode_or_default(apply, "an argument map")?),
            ModOpType::Depend => Self::Depend(decode_or_default(apply, "a list of module names")?),
        };
        Ok(action)
    }
}

fn fragment(apply: Option<Value>) -> Result<Vec<ProcessorRef>, PayloadError> {
    decode_or_default(apply, "a list of processors")
}

fn decode_or_default<T>(apply: Option<Value>, expected: &'static str) -> Result<T, PayloadError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match apply {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|source| PayloadError::Shape { expected, source })
        }
    }
}

fn default_max_apply_count() -> u32 {
    1
}

/// Wire form of a [`ModOp`], as stored alongside a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModOpSpec {
    #[serde(rename = "type")]
    pub op_type: ModOpType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<OpFilterSpec>,
    #[serde(default = "default_max_apply_count")]
    pub max_apply_count: u32,
}

/// A single pipeline edit instruction.
///
/// Each op carries a bounded-use budget. Selecting the op for a processor
/// consumes one use immediately; once `max_apply_count` uses are spent the
/// op no longer matches anything for the lifetime of this value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ModOpSpec")]
pub struct ModOp {
    pub action: ModOpAction,
    pub filter: Option<OpFilter>,
    pub max_apply_count: u32,
    apply_count: u32,
}

impl ModOp {
    /// Create an unfiltered op that may be applied once.
    pub fn new(action: ModOpAction) -> Self {
        Self {
            action,
            filter: None,
            max_apply_count: default_max_apply_count(),
            apply_count: 0,
        }
    }

    pub fn with_filter(mut self, filter: OpFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_max_apply_count(mut self, max_apply_count: u32) -> Self {
        self.max_apply_count = max_apply_count;
        self
    }

    pub fn op_type(&self) -> ModOpType {
        self.action.op_type()
    }

    /// Number of times this op has been selected.
    pub fn apply_count(&self) -> u32 {
        self.apply_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.apply_count >= self.max_apply_count
    }

    /// Select this op for a processor if it still has budget and its filter
    /// accepts the class name. A successful selection consumes one use.
    pub(crate) fn try_select(&mut self, class_name: &str, semantics: NotFilterSemantics) -> bool {
        if self.is_exhausted() {
            return false;
        }

        let matched = self
            .filter
            .as_ref()
            .is_none_or(|filter| filter.matches(class_name, semantics));
        if matched {
            self.apply_count += 1;
        }
        matched
    }
}

impl TryFrom<ModOpSpec> for ModOp {
    type Error = PayloadError;

    fn try_from(spec: ModOpSpec) -> Result<Self, Self::Error> {
        let filter = spec.filter.map(OpFilter::try_from).transpose()?;
        Ok(Self {
            action: ModOpAction::decode(spec.op_type, spec.apply)?,
            filter,
            max_apply_count: spec.max_apply_count,
            apply_count: 0,
        })
    }
}

impl Serialize for ModOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Payload<'a> {
            Fragment(&'a [ProcessorRef]),
            Names(&'a [String]),
            Args(&'a Args),
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            #[serde(rename = "type")]
            op_type: ModOpType,
            #[serde(skip_serializing_if = "Option::is_none")]
            apply: Option<Payload<'a>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<&'a OpFilter>,
            max_apply_count: u32,
        }

        let apply = match &self.action {
            ModOpAction::AddBefore(frag)
            | ModOpAction::AddAfter(frag)
            | ModOpAction::Append(frag)
            | ModOpAction::AppendMerge(frag)
            | ModOpAction::Prepend(frag)
            | ModOpAction::Last(frag)
            | ModOpAction::Replace(frag) => Some(Payload::Fragment(frag)),
            ModOpAction::SetArgs(args) => Some(Payload::Args(args)),
            ModOpAction::Depend(names) => Some(Payload::Names(names)),
            ModOpAction::Remove => None,
        };

        Wire {
            op_type: self.op_type(),
            apply,
            filter: self.filter.as_ref(),
            max_apply_count: self.max_apply_count,
        }
        .serialize(serializer)
    }
}

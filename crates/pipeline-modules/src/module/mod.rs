//! Pipeline modules: named, reusable bundles of pipeline edit ops.

mod filter;
mod op;

pub use filter::{FilterError, NotFilterSemantics, OpFilter, OpFilterSpec, OpFilterType};
pub use op::{ModOp, ModOpAction, ModOpSpec, ModOpType, PayloadError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The general types of media a module can handle.
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
pub enum FileType {
    Images,
    Videos,
    Documents,
}

/// Wire form of a [`PipelineModule`].
///
/// Ops are kept raw here so that a bad payload can be reported against the
/// module and op that carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub category: String,
    /// The objective of the module.
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub supported_media: Vec<FileType>,
    #[serde(default)]
    pub ops: Vec<ModOpSpec>,
    #[serde(default)]
    pub standard: bool,
}

/// A decoded pipeline module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ModuleSpec")]
pub struct PipelineModule {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub provider: String,
    pub category: String,
    /// The objective of the module, aggregated into `pipeline.objectives`.
    #[serde(rename = "type")]
    pub module_type: String,
    pub supported_media: Vec<FileType>,
    pub ops: Vec<ModOp>,
    /// Platform-owned rather than project-owned.
    pub standard: bool,
    /// Stamped onto every processor this module contributes.
    #[serde(skip)]
    pub force: bool,
}

impl PipelineModule {
    /// Create a project module with the given ops.
    pub fn new(name: impl Into<String>, module_type: impl Into<String>, ops: Vec<ModOp>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            provider: String::new(),
            category: String::new(),
            module_type: module_type.into(),
            supported_media: Vec::new(),
            ops,
            standard: false,
            force: false,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Decode a module from its wire form, decoding every op payload.
    pub fn from_spec(spec: ModuleSpec) -> Result<Self> {
        let ModuleSpec {
            id,
            name,
            description,
            provider,
            category,
            module_type,
            supported_media,
            ops,
            standard,
        } = spec;

        let ops = ops
            .into_iter()
            .enumerate()
            .map(|(index, op)| {
                let op_type = op.op_type;
                ModOp::try_from(op).map_err(|e| Error::MalformedOp {
                    module: name.clone(),
                    index,
                    op_type: op_type.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: id.unwrap_or_else(Uuid::new_v4),
            name,
            description,
            provider,
            category,
            module_type,
            supported_media,
            ops,
            standard,
            force: false,
        })
    }

    /// Whether `key` names this module, either by name or by id.
    pub fn is_named(&self, key: &str) -> bool {
        self.name == key || Uuid::parse_str(key).is_ok_and(|id| id == self.id)
    }
}

impl TryFrom<ModuleSpec> for PipelineModule {
    type Error = Error;

    fn try_from(spec: ModuleSpec) -> Result<Self> {
        PipelineModule::from_spec(spec)
    }
}

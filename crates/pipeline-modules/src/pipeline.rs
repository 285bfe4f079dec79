//! Stored pipeline definitions and resolved pipelines.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::processor::ProcessorRef;

/// Global argument holding the objectives of every applied module.
pub const OBJECTIVES_ARG: &str = "pipeline.objectives";

/// How a stored pipeline is built.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineMode {
    /// Built by applying modules to the standard pipeline.
    #[default]
    Modular,
    /// A literal list of processors.
    Custom,
}

/// A named pipeline as kept by the pipeline store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub mode: PipelineMode,
    /// Module ids applied, in order, for modular pipelines.
    #[serde(default)]
    pub modules: Vec<Uuid>,
    /// Literal processors for custom pipelines.
    #[serde(default)]
    pub processors: Vec<ProcessorRef>,
}

impl PipelineDefinition {
    /// Create a modular pipeline over the given module ids.
    pub fn modular(name: impl Into<String>, modules: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mode: PipelineMode::Modular,
            modules,
            processors: Vec::new(),
        }
    }

    /// Create a custom pipeline from literal processors.
    pub fn custom(name: impl Into<String>, processors: Vec<ProcessorRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            mode: PipelineMode::Custom,
            modules: Vec::new(),
            processors,
        }
    }
}

/// The final, executable form of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPipeline {
    /// Ordered processors to execute.
    pub execute: Vec<ProcessorRef>,
    /// Arguments visible to every processor.
    pub global_args: BTreeMap<String, Value>,
}

impl ResolvedPipeline {
    pub fn new(execute: Vec<ProcessorRef>, objectives: BTreeSet<String>) -> Self {
        let mut global_args = BTreeMap::new();
        global_args.insert(
            OBJECTIVES_ARG.to_string(),
            Value::Array(objectives.into_iter().map(Value::String).collect()),
        );
        Self {
            execute,
            global_args,
        }
    }

    /// Objectives recorded under [`OBJECTIVES_ARG`].
    pub fn objectives(&self) -> Vec<&str> {
        self.global_args
            .get(OBJECTIVES_ARG)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Class names of the executed processors, in order.
    pub fn class_names(&self) -> Vec<&str> {
        self.execute.iter().map(|p| p.class_name.as_str()).collect()
    }
}

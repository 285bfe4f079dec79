//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::module::NotFilterSemantics;
use crate::processor::ProcessorRef;
use crate::standard;

/// Configuration for [`PipelineResolver`](crate::PipelineResolver).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResolverConfig {
    /// Replaces the built-in standard pipeline when set.
    pub standard_pipeline: Option<Vec<ProcessorRef>>,
    /// How `NOT_REGEX` and `NOT_SUBSTR` filters are evaluated.
    pub not_filter_semantics: NotFilterSemantics,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard_pipeline(mut self, pipeline: Vec<ProcessorRef>) -> Self {
        self.standard_pipeline = Some(pipeline);
        self
    }

    pub fn with_not_filter_semantics(mut self, semantics: NotFilterSemantics) -> Self {
        self.not_filter_semantics = semantics;
        self
    }

    /// The baseline processor sequence. It always holds exactly one prepend
    /// marker; an override without one gets it appended.
    pub fn standard_pipeline(&self) -> Vec<ProcessorRef> {
        let Some(custom) = &self.standard_pipeline else {
            return standard::standard_pipeline();
        };

        let mut pipeline = Vec::with_capacity(custom.len() + 1);
        let mut has_marker = false;
        for proc in custom {
            if proc.is_prepend_marker() {
                if has_marker {
                    continue;
                }
                has_marker = true;
            }
            pipeline.push(proc.clone());
        }
        if !has_marker {
            pipeline.push(ProcessorRef::prepend_marker());
        }
        pipeline
    }
}

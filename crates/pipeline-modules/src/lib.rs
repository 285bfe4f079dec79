//! # Pipeline Modules
//!
//! This crate resolves ordered lists of pipeline modules into the concrete,
//! ordered list of processors a job executor runs against an asset.
//!
//! A module is a named bundle of edit ops (insert, remove, replace, merge
//! arguments, depend on other modules). Starting from the platform standard
//! pipeline, the resolver applies each module in turn and strips the prepend
//! marker from the result.
//!
//! ## Features
//!
//! - Typed op payloads decoded once, when a module is loaded
//! - Call-scoped op budgets: stores hand out owned module copies
//! - Recursive `DEPEND` expansion with cycle detection
//! - In-memory module and pipeline stores plus the standard module catalog
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use pipeline_modules::{InMemoryModuleStore, InMemoryPipelineStore, PipelineResolver};
//!
//! let resolver = PipelineResolver::new(
//!     Arc::new(InMemoryModuleStore::with_standard_modules()),
//!     Arc::new(InMemoryPipelineStore::new()),
//! );
//! let resolved = resolver
//!     .resolve_modular(&["gcp-label-detection".to_string()], true)
//!     .unwrap();
//! assert_eq!(resolved.objectives(), vec!["Label Detection"]);
//! ```
//!
//! ## License
//!
//! MIT License

pub mod builder;
pub mod config;
pub mod error;
pub mod module;
pub mod pipeline;
pub mod processor;
pub mod resolver;
pub mod standard;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use builder::{PipelineBuilder, ResolveState, Rewrite};
pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use module::{
    FileType, ModOp, ModOpAction, ModOpSpec, ModOpType, ModuleSpec, NotFilterSemantics, OpFilter,
    OpFilterType, PipelineModule,
};
pub use pipeline::{OBJECTIVES_ARG, PipelineDefinition, PipelineMode, ResolvedPipeline};
pub use processor::{Args, PREPEND_MARKER_CLASS, ProcessorRef};
pub use resolver::PipelineResolver;
pub use store::{InMemoryModuleStore, InMemoryPipelineStore, ModuleStore, PipelineStore};

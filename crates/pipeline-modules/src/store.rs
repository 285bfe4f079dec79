//! Module and pipeline stores.
//!
//! The resolver only reads through these traits. Every lookup hands out an
//! owned copy of the stored value, so op budgets consumed during one resolve
//! call never leak into another.

use uuid::Uuid;

use crate::module::{ModuleSpec, PipelineModule};
use crate::pipeline::PipelineDefinition;
use crate::standard;
use crate::{Error, Result};

/// Prefix marking a module name as forced.
pub const FORCE_PREFIX: char = '+';

const MODULE_ENTITY: &str = "Pipeline module";
const PIPELINE_ENTITY: &str = "Pipeline";

/// Split a `+name` entry into its name and force flag.
pub fn parse_forced(entry: &str) -> (&str, bool) {
    match entry.strip_prefix(FORCE_PREFIX) {
        Some(name) => (name, true),
        None => (entry, false),
    }
}

/// Source of pipeline modules.
pub trait ModuleStore: Send + Sync {
    /// Look up a module by name or by id string.
    fn find(&self, name_or_id: &str) -> Option<PipelineModule>;

    /// Every stored module, in registration order.
    fn list(&self) -> Vec<PipelineModule>;

    /// Modules flagged as platform standard.
    fn get_standard_modules(&self) -> Vec<PipelineModule> {
        self.list().into_iter().filter(|m| m.standard).collect()
    }

    fn get_by_name(&self, name: &str) -> Result<PipelineModule> {
        let (key, force) = parse_forced(name);
        self.find(key)
            .map(|m| m.with_force(force))
            .ok_or_else(|| Error::not_found(MODULE_ENTITY, [key.to_string()]))
    }

    /// Fetch modules in the given order. Entries may be names or id strings,
    /// and a leading `+` marks the module forced. Fails naming every entry
    /// that could not be found.
    fn get_by_names(&self, names: &[String]) -> Result<Vec<PipelineModule>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for entry in names {
            let (key, force) = parse_forced(entry);
            match self.find(key) {
                Some(module) => found.push(module.with_force(force)),
                None => missing.push(key.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(Error::not_found(MODULE_ENTITY, missing));
        }
        Ok(found)
    }

    fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PipelineModule>> {
        let names: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        self.get_by_names(&names)
    }
}

/// Source of stored pipeline definitions.
pub trait PipelineStore: Send + Sync {
    fn find(&self, name_or_id: &str) -> Option<PipelineDefinition>;

    fn list(&self) -> Vec<PipelineDefinition>;

    /// The pipeline used when a caller names none.
    fn get_default(&self) -> Result<PipelineDefinition>;

    fn get(&self, name_or_id: &str) -> Result<PipelineDefinition> {
        self.find(name_or_id)
            .ok_or_else(|| Error::not_found(PIPELINE_ENTITY, [name_or_id.to_string()]))
    }
}

/// Module store backed by a vector.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModuleStore {
    modules: Vec<PipelineModule>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with the standard module catalog.
    pub fn with_standard_modules() -> Self {
        Self::with_modules(standard::standard_modules())
    }

    pub fn with_modules(modules: impl IntoIterator<Item = PipelineModule>) -> Self {
        let mut store = Self::new();
        for module in modules {
            store.insert(module);
        }
        store
    }

    /// Decode and register modules from their wire form.
    pub fn from_specs(specs: impl IntoIterator<Item = ModuleSpec>) -> Result<Self> {
        let mut store = Self::new();
        for spec in specs {
            store.insert(PipelineModule::from_spec(spec)?);
        }
        Ok(store)
    }

    /// Register a module, replacing any module with the same name.
    pub fn insert(&mut self, module: PipelineModule) {
        match self.modules.iter_mut().find(|m| m.name == module.name) {
            Some(existing) => *existing = module,
            None => self.modules.push(module),
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleStore for InMemoryModuleStore {
    fn find(&self, name_or_id: &str) -> Option<PipelineModule> {
        self.modules.iter().find(|m| m.is_named(name_or_id)).cloned()
    }

    fn list(&self) -> Vec<PipelineModule> {
        self.modules.clone()
    }
}

/// Pipeline store backed by a vector.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPipelineStore {
    pipelines: Vec<PipelineDefinition>,
    default_pipeline: Option<Uuid>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline, replacing any pipeline with the same name. The
    /// first pipeline registered becomes the default.
    pub fn insert(&mut self, pipeline: PipelineDefinition) {
        if self.default_pipeline.is_none() {
            self.default_pipeline = Some(pipeline.id);
        }
        match self.pipelines.iter_mut().find(|p| p.name == pipeline.name) {
            Some(existing) => {
                if self.default_pipeline == Some(existing.id) {
                    self.default_pipeline = Some(pipeline.id);
                }
                *existing = pipeline;
            }
            None => self.pipelines.push(pipeline),
        }
    }

    /// Make the named pipeline the default.
    pub fn set_default(&mut self, name_or_id: &str) -> Result<()> {
        let id = self.get(name_or_id)?.id;
        self.default_pipeline = Some(id);
        Ok(())
    }
}

impl PipelineStore for InMemoryPipelineStore {
    fn find(&self, name_or_id: &str) -> Option<PipelineDefinition> {
        let id = Uuid::parse_str(name_or_id).ok();
        self.pipelines
            .iter()
            .find(|p| p.name == name_or_id || Some(p.id) == id)
            .cloned()
    }

    fn list(&self) -> Vec<PipelineDefinition> {
        self.pipelines.clone()
    }

    fn get_default(&self) -> Result<PipelineDefinition> {
        self.default_pipeline
            .and_then(|id| self.pipelines.iter().find(|p| p.id == id))
            .cloned()
            .ok_or_else(|| Error::not_found(PIPELINE_ENTITY, ["default".to_string()]))
    }
}

//! Multi-module driver.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::builder::{PipelineBuilder, ResolveState};
use crate::config::ResolverConfig;
use crate::module::PipelineModule;
use crate::pipeline::{PipelineDefinition, PipelineMode, ResolvedPipeline};
use crate::processor::ProcessorRef;
use crate::store::{ModuleStore, PipelineStore, parse_forced};
use crate::{Error, Result};

/// Prefix removing a module from a stored pipeline's module list.
pub const REMOVE_PREFIX: char = '-';

/// Turns stored pipelines and module lists into resolved pipelines.
#[derive(Clone)]
pub struct PipelineResolver {
    modules: Arc<dyn ModuleStore>,
    pipelines: Arc<dyn PipelineStore>,
    config: ResolverConfig,
}

impl PipelineResolver {
    pub fn new(modules: Arc<dyn ModuleStore>, pipelines: Arc<dyn PipelineStore>) -> Self {
        Self {
            modules,
            pipelines,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a stored pipeline, or the default one, adjusted by `modules`.
    ///
    /// Each adjustment is a module name or id. `-name` drops the module,
    /// `+name` adds it forced (or forces one already listed) and a bare name
    /// adds it. Every adjustment must name a known module. Adjusting a custom
    /// pipeline is rejected.
    pub fn resolve(
        &self,
        pipeline: Option<&str>,
        modules: Option<&[String]>,
    ) -> Result<ResolvedPipeline> {
        self.resolve_stored(pipeline, modules.unwrap_or_default(), true)
    }

    /// [`resolve`](Self::resolve), applying a modular pipeline's modules to
    /// a bare prepend marker when `include_standard` is false.
    pub fn resolve_stored(
        &self,
        pipeline: Option<&str>,
        adjustments: &[String],
        include_standard: bool,
    ) -> Result<ResolvedPipeline> {
        let definition = match pipeline {
            Some(key) => self.pipelines.get(key)?,
            None => self.pipelines.get_default()?,
        };
        self.resolve_pipeline_with(&definition, adjustments, include_standard)
    }

    pub fn resolve_default(&self) -> Result<ResolvedPipeline> {
        self.resolve(None, None)
    }

    pub fn resolve_id(&self, id: Uuid) -> Result<ResolvedPipeline> {
        let definition = self.pipelines.get(&id.to_string())?;
        self.resolve_pipeline(&definition)
    }

    /// Resolve a pipeline definition as stored.
    pub fn resolve_pipeline(&self, definition: &PipelineDefinition) -> Result<ResolvedPipeline> {
        self.resolve_pipeline_with(definition, &[], true)
    }

    /// Resolve a modular definition. Custom definitions are rejected before
    /// any module is loaded.
    pub fn resolve_modular_pipeline(
        &self,
        definition: &PipelineDefinition,
        adjustments: &[String],
    ) -> Result<ResolvedPipeline> {
        self.resolve_modular_definition(definition, adjustments, true)
    }

    fn resolve_modular_definition(
        &self,
        definition: &PipelineDefinition,
        adjustments: &[String],
        include_standard: bool,
    ) -> Result<ResolvedPipeline> {
        if definition.mode != PipelineMode::Modular {
            return Err(invalid_mode(definition, "resolve modules"));
        }

        let modules = self.modules.get_by_ids(&definition.modules)?;
        let modules = self.adjust(modules, adjustments)?;
        debug!(
            pipeline = %definition.name,
            modules = modules.len(),
            include_standard,
            "Resolving modular pipeline"
        );
        self.resolve_modules(modules, include_standard)
    }

    fn resolve_pipeline_with(
        &self,
        definition: &PipelineDefinition,
        adjustments: &[String],
        include_standard: bool,
    ) -> Result<ResolvedPipeline> {
        match definition.mode {
            PipelineMode::Modular => {
                self.resolve_modular_definition(definition, adjustments, include_standard)
            }
            PipelineMode::Custom if !adjustments.is_empty() => {
                Err(invalid_mode(definition, "apply module adjustments"))
            }
            PipelineMode::Custom => {
                debug!(pipeline = %definition.name, "Resolving custom pipeline");
                Ok(self.resolve_custom(&definition.processors))
            }
        }
    }

    fn adjust(
        &self,
        mut modules: Vec<PipelineModule>,
        adjustments: &[String],
    ) -> Result<Vec<PipelineModule>> {
        let mut removals: Vec<String> = Vec::new();
        let mut additions: Vec<String> = Vec::new();

        for entry in adjustments {
            if let Some(name) = entry.strip_prefix(REMOVE_PREFIX) {
                modules.retain(|m| !m.is_named(name));
                additions.retain(|added| parse_forced(added).0 != name);
                removals.push(name.to_string());
                continue;
            }

            let (name, force) = parse_forced(entry);
            match modules.iter_mut().find(|m| m.is_named(name)) {
                Some(existing) => existing.force |= force,
                None => additions.push(entry.clone()),
            }
        }

        // Unknown removals and additions are reported together.
        let lookups: Vec<String> = removals.iter().chain(&additions).cloned().collect();
        let mut found = self.modules.get_by_names(&lookups)?;
        modules.extend(found.split_off(removals.len()));
        Ok(modules)
    }

    /// Fetch the named modules and resolve them in order.
    pub fn resolve_modular(
        &self,
        names: &[String],
        include_standard: bool,
    ) -> Result<ResolvedPipeline> {
        let modules = self.modules.get_by_names(names)?;
        self.resolve_modules(modules, include_standard)
    }

    /// Apply `modules` in order to the standard pipeline, or to a bare
    /// prepend marker when `include_standard` is false.
    pub fn resolve_modules(
        &self,
        modules: Vec<PipelineModule>,
        include_standard: bool,
    ) -> Result<ResolvedPipeline> {
        let mut current = if include_standard {
            self.config.standard_pipeline()
        } else {
            vec![ProcessorRef::prepend_marker()]
        };

        let mut state = ResolveState::new();
        let mut objectives = BTreeSet::new();

        for mut module in modules {
            let rewrite = PipelineBuilder::new(&current, self.modules.as_ref())
                .with_not_filter_semantics(self.config.not_filter_semantics)
                .apply_ops(&mut module, &mut state)?;
            current = rewrite.pipeline;

            objectives.insert(module.module_type);
        }

        current.retain(|proc| !proc.is_prepend_marker());

        info!(
            steps = current.len(),
            modules = state.applied_count(),
            objectives = ?objectives,
            "Resolved modular pipeline"
        );
        Ok(ResolvedPipeline::new(current, objectives))
    }

    /// Resolve a literal processor list. No module machinery applies.
    pub fn resolve_custom(&self, refs: &[ProcessorRef]) -> ResolvedPipeline {
        let execute = self.resolve_processors(refs);
        info!(steps = execute.len(), "Resolved custom pipeline");
        ResolvedPipeline::new(execute, BTreeSet::new())
    }

    /// Copy `refs`, resolving nested `execute` lists and dropping any prepend
    /// marker at every level.
    pub fn resolve_processors(&self, refs: &[ProcessorRef]) -> Vec<ProcessorRef> {
        refs.iter()
            .filter(|proc| !proc.is_prepend_marker())
            .map(|proc| {
                let mut proc = proc.clone();
                if let Some(nested) = proc.execute.take() {
                    proc.execute = Some(self.resolve_processors(&nested));
                }
                proc
            })
            .collect()
    }

    /// A copy of the standard pipeline, optionally without its marker.
    pub fn standard_pipeline(&self, trim_marker: bool) -> Vec<ProcessorRef> {
        let mut pipeline = self.config.standard_pipeline();
        if trim_marker {
            pipeline.retain(|proc| !proc.is_prepend_marker());
        }
        pipeline
    }
}

fn invalid_mode(definition: &PipelineDefinition, operation: &'static str) -> Error {
    Error::InvalidPipelineMode {
        pipeline: definition.name.clone(),
        mode: definition.mode.to_string(),
        operation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModOp, ModOpAction, OpFilter};
    use crate::standard::{self, FILE_IMPORT_PROCESSOR};
    use crate::store::{InMemoryModuleStore, InMemoryPipelineStore};
    use crate::test_utils::{init_tracing, proc};

    fn resolver_with(
        modules: InMemoryModuleStore,
        pipelines: InMemoryPipelineStore,
    ) -> PipelineResolver {
        PipelineResolver::new(Arc::new(modules), Arc::new(pipelines))
    }

    fn standard_resolver() -> PipelineResolver {
        resolver_with(
            InMemoryModuleStore::with_standard_modules(),
            InMemoryPipelineStore::new(),
        )
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_resolve_video_intelligence_modules() {
        init_tracing();
        let resolver = standard_resolver();
        let names = strings(&[
            "gcp-video-label-detection",
            "gcp-video-logo-detection",
            "gcp-video-object-detection",
            "gcp-video-explicit-detection",
            "gcp-video-text-detection",
            "gcp-speech-to-text",
        ]);

        let resolved = resolver.resolve_modular(&names, true).unwrap();
        assert_eq!(resolved.execute.len(), 7);

        let video = &resolved.execute[5];
        for feature in [
            "detect_labels",
            "detect_logos",
            "detect_objects",
            "detect_explicit",
            "detect_text",
        ] {
            assert_eq!(video.args[feature], true, "missing {feature}");
        }
        assert_eq!(video.module.as_deref(), Some("gcp-video-label-detection"));

        let bare = resolver.resolve_modular(&names, false).unwrap();
        assert_eq!(bare.execute.len(), 2);
    }

    #[test]
    fn test_objectives_are_sorted_and_unique() {
        let resolver = standard_resolver();
        let resolved = resolver
            .resolve_modular(
                &strings(&["gcp-label-detection", "platform-face-detection", "platform-label-detection"]),
                true,
            )
            .unwrap();
        assert_eq!(
            resolved.objectives(),
            vec![standard::objective::FACE_RECOGNITION, standard::objective::LABEL_DETECTION]
        );
    }

    #[test]
    fn test_set_args_reaches_file_import() {
        let resolver = standard_resolver();
        let resolved = resolver
            .resolve_modular(&strings(&["platform-text-detection"]), true)
            .unwrap();

        let import = resolved
            .execute
            .iter()
            .find(|p| p.class_name == FILE_IMPORT_PROCESSOR)
            .unwrap();
        assert_eq!(import.args["ocr"], true);
        assert_eq!(
            resolved.class_names().last(),
            Some(&"plugins_analysis.platform.OcrProcessor")
        );
    }

    #[test]
    fn test_unknown_modules_are_all_reported() {
        let err = standard_resolver()
            .resolve_modular(&strings(&["nope", "gcp-label-detection", "nada"]), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Pipeline module not found: nope, nada");
    }

    #[test]
    fn test_resolve_stored_pipeline_with_adjustments() {
        let modules = InMemoryModuleStore::with_modules([
            PipelineModule::new("a", "A", vec![ModOp::new(ModOpAction::Append(vec![proc("PA")]))]),
            PipelineModule::new("b", "B", vec![ModOp::new(ModOpAction::Append(vec![proc("PB")]))]),
            PipelineModule::new("c", "C", vec![ModOp::new(ModOpAction::Append(vec![proc("PC")]))]),
        ]);
        let ids = vec![modules.find("a").unwrap().id, modules.find("b").unwrap().id];
        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(PipelineDefinition::modular("default", ids));
        let resolver = resolver_with(modules, pipelines)
            .with_config(ResolverConfig::new().with_standard_pipeline(vec![]));

        let resolved = resolver.resolve_default().unwrap();
        assert_eq!(resolved.class_names(), vec!["PA", "PB"]);

        let adjustments = strings(&["-a", "+c", "+b"]);
        let resolved = resolver.resolve(Some("default"), Some(&adjustments)).unwrap();
        assert_eq!(resolved.class_names(), vec!["PB", "PC"]);
        assert!(resolved.execute.iter().all(|p| p.force));
        assert_eq!(resolved.objectives(), vec!["B", "C"]);
    }

    fn stored_resolver() -> PipelineResolver {
        let modules = InMemoryModuleStore::with_modules([
            PipelineModule::new("a", "A", vec![ModOp::new(ModOpAction::Append(vec![proc("PA")]))]),
            PipelineModule::new("b", "B", vec![ModOp::new(ModOpAction::Append(vec![proc("PB")]))]),
        ]);
        let ids = vec![modules.find("a").unwrap().id, modules.find("b").unwrap().id];
        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(PipelineDefinition::modular("default", ids));
        resolver_with(modules, pipelines)
    }

    #[test]
    fn test_unknown_removal_fails() {
        let resolver = stored_resolver();

        let err = resolver
            .resolve(Some("default"), Some(&strings(&["-ghost"])))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Pipeline module not found: ghost");

        let err = resolver
            .resolve(None, Some(&strings(&["-ghost", "-a", "phantom"])))
            .unwrap_err();
        assert_eq!(err.to_string(), "Pipeline module not found: ghost, phantom");
    }

    #[test]
    fn test_removal_by_id_is_accepted() {
        let resolver = stored_resolver();
        let id = resolver.modules.find("a").unwrap().id;

        let resolved = resolver
            .resolve_stored(None, &[format!("-{id}")], false)
            .unwrap();
        assert_eq!(resolved.class_names(), vec!["PB"]);
    }

    #[test]
    fn test_stored_pipeline_without_standard() {
        let resolver = stored_resolver();

        let bare = resolver.resolve_stored(Some("default"), &[], false).unwrap();
        assert_eq!(bare.class_names(), vec!["PA", "PB"]);

        let full = resolver.resolve_stored(Some("default"), &[], true).unwrap();
        assert_eq!(full.execute.len(), resolver.standard_pipeline(true).len() + 2);
        assert_eq!(full, resolver.resolve_default().unwrap());
    }

    #[test]
    fn test_untyped_module_still_counts_as_objective() {
        let modules = InMemoryModuleStore::with_modules([
            PipelineModule::new("untyped", "", vec![ModOp::new(ModOpAction::Append(vec![proc("U")]))]),
            PipelineModule::new("typed", "Typed", vec![]),
        ]);
        let resolver = resolver_with(modules, InMemoryPipelineStore::new());

        let resolved = resolver
            .resolve_modular(&strings(&["untyped", "typed"]), false)
            .unwrap();
        assert_eq!(resolved.objectives(), vec!["", "Typed"]);
    }

    #[test]
    fn test_custom_pipeline_resolves_nested_processors() {
        let custom = PipelineDefinition::custom(
            "custom",
            vec![
                proc("Outer").with_execute(vec![proc("Inner"), ProcessorRef::prepend_marker()]),
                ProcessorRef::prepend_marker(),
            ],
        );
        let id = custom.id;
        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(custom);
        let resolver = resolver_with(InMemoryModuleStore::new(), pipelines);

        let resolved = resolver.resolve_id(id).unwrap();
        assert_eq!(resolved.class_names(), vec!["Outer"]);
        let nested = resolved.execute[0].execute.as_ref().unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].class_name, "Inner");
        assert!(resolved.objectives().is_empty());
    }

    #[test]
    fn test_adjusting_custom_pipeline_is_rejected() {
        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(PipelineDefinition::custom("custom", vec![proc("A")]));
        let resolver = resolver_with(InMemoryModuleStore::with_standard_modules(), pipelines);

        let err = resolver
            .resolve(Some("custom"), Some(&strings(&["gcp-label-detection"])))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPipelineMode { .. }));
        assert_eq!(
            err.to_string(),
            "Pipeline 'custom' is CUSTOM, cannot apply module adjustments"
        );

        let definition = resolver.pipelines.get("custom").unwrap();
        assert!(matches!(
            resolver.resolve_modular_pipeline(&definition, &[]),
            Err(Error::InvalidPipelineMode { .. })
        ));
    }

    #[test]
    fn test_standard_pipeline_trim() {
        let resolver = standard_resolver();
        let full = resolver.standard_pipeline(false);
        let trimmed = resolver.standard_pipeline(true);
        assert_eq!(full.len(), trimmed.len() + 1);
        assert!(trimmed.iter().all(|p| !p.is_prepend_marker()));
    }

    #[test]
    fn test_remove_from_standard_pipeline() {
        let modules = InMemoryModuleStore::with_modules([PipelineModule::new(
            "no-proxies",
            "Cleanup",
            vec![
                ModOp::new(ModOpAction::Remove)
                    .with_filter(OpFilter::substr("Proxy"))
                    .with_max_apply_count(5),
            ],
        )]);
        let resolver = resolver_with(modules, InMemoryPipelineStore::new());

        let resolved = resolver
            .resolve_modular(&strings(&["no-proxies"]), true)
            .unwrap();
        assert!(resolved.class_names().iter().all(|c| !c.contains("Proxy")));
        assert_eq!(resolved.execute.len(), 3);
    }
}

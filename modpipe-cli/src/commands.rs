use std::path::Path;
use std::sync::Arc;

use pipeline_modules::{
    InMemoryModuleStore, InMemoryPipelineStore, ModuleStore, PipelineResolver, ResolvedPipeline,
};
use tracing::{debug, info};

use crate::catalog::{Catalog, standard_catalog};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::OutputManager;

pub struct CommandExecutor {
    config: AppConfig,
    modules: Arc<InMemoryModuleStore>,
    resolver: PipelineResolver,
    output: OutputManager,
}

impl CommandExecutor {
    /// Build the stores from `catalog`, the configured catalog, or the
    /// standard catalog when neither is set.
    pub fn new(config: AppConfig, catalog: Option<&Path>, colored: bool) -> Result<Self> {
        let catalog = match catalog.or(config.catalog.as_deref()) {
            Some(path) => Catalog::load(path)?,
            None => {
                debug!("No catalog given, using the standard catalog");
                standard_catalog()
            }
        };
        let (modules, pipelines) = catalog.into_stores()?;
        Ok(Self::with_stores(config, modules, pipelines, colored))
    }

    pub fn with_stores(
        config: AppConfig,
        modules: InMemoryModuleStore,
        pipelines: InMemoryPipelineStore,
        colored: bool,
    ) -> Self {
        let modules = Arc::new(modules);
        let resolver = PipelineResolver::new(modules.clone(), Arc::new(pipelines))
            .with_config(config.resolver.clone());
        Self {
            config,
            modules,
            resolver,
            output: OutputManager::new(colored),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolve a stored pipeline adjusted by `modules` when `pipeline` is set
    /// or no modules are given, otherwise resolve `modules` directly.
    pub fn resolve(
        &self,
        modules: &[String],
        pipeline: Option<&str>,
        no_standard: bool,
    ) -> Result<ResolvedPipeline> {
        let include_standard = self.config.include_standard && !no_standard;

        let resolved = if pipeline.is_some() || modules.is_empty() {
            info!(
                pipeline = pipeline.unwrap_or("<default>"),
                include_standard,
                "Resolving stored pipeline"
            );
            self.resolver
                .resolve_stored(pipeline, modules, include_standard)?
        } else {
            info!(modules = ?modules, include_standard, "Resolving modules");
            self.resolver.resolve_modular(modules, include_standard)?
        };
        Ok(resolved)
    }

    pub fn run_resolve(
        &self,
        modules: &[String],
        pipeline: Option<&str>,
        no_standard: bool,
        format: OutputFormat,
    ) -> Result<String> {
        let resolved = self.resolve(modules, pipeline, no_standard)?;
        self.output.format_resolved(&resolved, format)
    }

    pub fn run_standard(&self, format: OutputFormat) -> Result<String> {
        let pipeline = self.resolver.standard_pipeline(true);
        self.output.format_processors(&pipeline, format)
    }

    pub fn run_modules(&self, standard_only: bool, format: OutputFormat) -> Result<String> {
        let modules = if standard_only {
            self.modules.get_standard_modules()
        } else {
            self.modules.list()
        };
        self.output.format_modules(&modules, format)
    }

    pub fn run_config(&self) -> Result<String> {
        self.config.show()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_modules::{ModOp, ModOpAction, PipelineDefinition, PipelineModule, ProcessorRef};

    fn executor() -> CommandExecutor {
        let mut modules = InMemoryModuleStore::with_standard_modules();
        let extra = PipelineModule::new(
            "thumbs",
            "Thumbnails",
            vec![ModOp::new(ModOpAction::Append(vec![ProcessorRef::new("Thumb", "core")]))],
        );
        let ids = vec![extra.id];
        modules.insert(extra);

        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(PipelineDefinition::modular("default", ids));

        CommandExecutor::with_stores(AppConfig::default(), modules, pipelines, false)
    }

    #[test]
    fn test_resolve_default_pipeline_when_no_modules() {
        let resolved = executor().resolve(&[], None, false).unwrap();
        assert_eq!(resolved.class_names().last(), Some(&"Thumb"));
    }

    #[test]
    fn test_resolve_adjusts_stored_pipeline() {
        let adjustments = vec!["-thumbs".to_string(), "gcp-label-detection".to_string()];
        let resolved = executor()
            .resolve(&adjustments, Some("default"), false)
            .unwrap();
        assert!(!resolved.class_names().contains(&"Thumb"));
        assert_eq!(resolved.objectives(), vec!["Label Detection"]);
    }

    #[test]
    fn test_resolve_modules_without_standard() {
        let resolved = executor()
            .resolve(&["thumbs".to_string()], None, true)
            .unwrap();
        assert_eq!(resolved.class_names(), vec!["Thumb"]);
    }

    #[test]
    fn test_resolve_stored_pipeline_without_standard() {
        let executor = executor();
        let resolved = executor.resolve(&[], Some("default"), true).unwrap();
        assert_eq!(resolved.class_names(), vec!["Thumb"]);

        let resolved = executor.resolve(&[], None, false).unwrap();
        assert!(resolved.execute.len() > 1);
    }

    #[test]
    fn test_config_can_exclude_standard_for_stored_pipeline() {
        let mut modules = InMemoryModuleStore::new();
        let extra = PipelineModule::new(
            "thumbs",
            "Thumbnails",
            vec![ModOp::new(ModOpAction::Append(vec![ProcessorRef::new("Thumb", "core")]))],
        );
        let ids = vec![extra.id];
        modules.insert(extra);
        let mut pipelines = InMemoryPipelineStore::new();
        pipelines.insert(PipelineDefinition::modular("default", ids));
        let config = AppConfig {
            include_standard: false,
            ..AppConfig::default()
        };

        let executor = CommandExecutor::with_stores(config, modules, pipelines, false);
        let resolved = executor.resolve(&[], None, false).unwrap();
        assert_eq!(resolved.class_names(), vec!["Thumb"]);
    }

    #[test]
    fn test_standard_output_has_no_marker() {
        let output = executor().run_standard(OutputFormat::JsonCompact).unwrap();
        assert!(!output.contains("PrependMarker"));
    }

    #[test]
    fn test_modules_listing() {
        let executor = executor();
        let all = executor.run_modules(false, OutputFormat::Pretty).unwrap();
        let standard = executor.run_modules(true, OutputFormat::Pretty).unwrap();
        assert!(all.contains("thumbs"));
        assert!(!standard.contains("thumbs"));
    }
}

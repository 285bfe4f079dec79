//! JSON catalog of modules and stored pipelines.

use std::fs;
use std::path::Path;

use pipeline_modules::{
    InMemoryModuleStore, InMemoryPipelineStore, ModuleSpec, PipelineDefinition, PipelineModule,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Register the standard modules before the catalog's own.
    #[serde(default = "default_true")]
    pub include_standard_modules: bool,
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub pipelines: Vec<PipelineDefinition>,
    /// Name or id of the default pipeline. The first pipeline otherwise.
    #[serde(default)]
    pub default_pipeline: Option<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            include_standard_modules: true,
            modules: Vec::new(),
            pipelines: Vec::new(),
            default_pipeline: None,
        }
    }
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| AppError::Read {
            kind: "catalog",
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        debug!(
            path = %path.display(),
            modules = catalog.modules.len(),
            pipelines = catalog.pipelines.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Decode every module and build the stores. Catalog modules replace
    /// standard modules of the same name.
    pub fn into_stores(self) -> Result<(InMemoryModuleStore, InMemoryPipelineStore)> {
        let mut modules = if self.include_standard_modules {
            InMemoryModuleStore::with_standard_modules()
        } else {
            InMemoryModuleStore::new()
        };
        for spec in self.modules {
            modules.insert(PipelineModule::from_spec(spec)?);
        }

        let mut pipelines = InMemoryPipelineStore::new();
        for pipeline in self.pipelines {
            pipelines.insert(pipeline);
        }
        if let Some(default) = &self.default_pipeline {
            pipelines.set_default(default)?;
        }

        Ok((modules, pipelines))
    }
}

/// A catalog with only the standard modules and a modular `standard`
/// pipeline over none of them.
pub fn standard_catalog() -> Catalog {
    Catalog {
        pipelines: vec![PipelineDefinition::modular("standard", Vec::new())],
        ..Catalog::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_modules::standard::standard_modules;
    use pipeline_modules::{ModuleStore, PipelineStore};
    use std::io::Write;

    #[test]
    fn test_load_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "modules": [
                    {{"name": "thumbs", "type": "Thumbnails",
                      "ops": [{{"type": "APPEND", "apply": [{{"className": "Thumb", "image": "core"}}]}}]}}
                ],
                "pipelines": [
                    {{"id": "5b1f5e0c-7c2a-4a8e-9d55-0f6c3e3c8a01", "name": "default", "mode": "CUSTOM",
                      "processors": [{{"className": "Only", "image": "core"}}]}}
                ],
                "defaultPipeline": "default"
            }}"#
        )
        .unwrap();

        let (modules, pipelines) = Catalog::load(file.path()).unwrap().into_stores().unwrap();
        assert_eq!(modules.len(), standard_modules().len() + 1);
        assert!(modules.find("thumbs").is_some());
        assert_eq!(pipelines.get_default().unwrap().name, "default");
    }

    #[test]
    fn test_unknown_default_pipeline_fails() {
        let catalog = Catalog {
            default_pipeline: Some("missing".to_string()),
            ..Catalog::default()
        };
        assert!(catalog.into_stores().is_err());
    }

    #[test]
    fn test_standard_catalog() {
        let (modules, pipelines) = standard_catalog().into_stores().unwrap();
        assert_eq!(modules.get_standard_modules().len(), standard_modules().len());
        assert_eq!(pipelines.get_default().unwrap().name, "standard");
    }
}

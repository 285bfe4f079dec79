use crate::{cli::OutputFormat, error::Result};
#[cfg(feature = "colored-output")]
use colored::*;
use pipeline_modules::{PipelineModule, ProcessorRef, ResolvedPipeline};
use serde::Serialize;
#[cfg(feature = "table-output")]
use tabled::{Table, Tabled, settings::Style};

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_resolved(&self, resolved: &ResolvedPipeline, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.format_json(resolved, true),
            OutputFormat::JsonCompact => self.format_json(resolved, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.processor_table(&resolved.execute)),
            _ => Ok(self.format_resolved_pretty(resolved)),
        }
    }

    pub fn format_processors(&self, processors: &[ProcessorRef], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.format_json(processors, true),
            OutputFormat::JsonCompact => self.format_json(processors, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.processor_table(processors)),
            _ => Ok(self.format_processors_pretty(processors)),
        }
    }

    pub fn format_modules(&self, modules: &[PipelineModule], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => self.format_json(modules, true),
            OutputFormat::JsonCompact => self.format_json(modules, false),
            #[cfg(feature = "table-output")]
            OutputFormat::Table => Ok(self.module_table(modules)),
            _ => Ok(self.format_modules_pretty(modules)),
        }
    }

    fn format_json<T: Serialize + ?Sized>(&self, value: &T, pretty: bool) -> Result<String> {
        if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(Into::into)
    }

    fn format_resolved_pretty(&self, resolved: &ResolvedPipeline) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize("Resolved Pipeline:", &Color::Green, true));
        output.push('\n');
        output.push_str(&self.format_processors_pretty(&resolved.execute));

        let objectives = resolved.objectives();
        if !objectives.is_empty() {
            output.push_str(&format!(
                "{}: {}\n",
                self.colorize("Objectives", &Color::Yellow, false),
                self.colorize(&objectives.join(", "), &Color::Cyan, false)
            ));
        }
        output
    }

    fn format_processors_pretty(&self, processors: &[ProcessorRef]) -> String {
        let mut output = String::new();
        self.push_processors(&mut output, processors, 1);
        output
    }

    fn push_processors(&self, output: &mut String, processors: &[ProcessorRef], depth: usize) {
        let indent = "  ".repeat(depth);
        for (index, proc) in processors.iter().enumerate() {
            output.push_str(&format!(
                "{}{}. {} [{}]",
                indent,
                index + 1,
                self.colorize(&proc.class_name, &Color::Cyan, true),
                self.colorize(&proc.image, &Color::Blue, false)
            ));
            if let Some(module) = &proc.module {
                output.push_str(&format!(" ({})", self.colorize(module, &Color::Yellow, false)));
            }
            if proc.force {
                output.push_str(" forced");
            }
            output.push('\n');

            for (key, value) in &proc.args {
                output.push_str(&format!(
                    "{}     {}: {}\n",
                    indent,
                    self.colorize(key, &Color::Green, false),
                    value
                ));
            }
            if let Some(nested) = &proc.execute {
                self.push_processors(output, nested, depth + 2);
            }
        }
    }

    fn format_modules_pretty(&self, modules: &[PipelineModule]) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize(
            &format!("Modules ({}):", modules.len()),
            &Color::Green,
            true,
        ));
        output.push('\n');

        for module in modules {
            output.push_str(&format!(
                "  {} - {}",
                self.colorize(&module.name, &Color::Cyan, true),
                module.module_type
            ));
            if !module.category.is_empty() {
                output.push_str(&format!(
                    " ({})",
                    self.colorize(&module.category, &Color::Yellow, false)
                ));
            }
            output.push('\n');
            if !module.description.is_empty() {
                output.push_str(&format!("      {}\n", module.description));
            }
        }
        output
    }

    #[cfg(feature = "table-output")]
    fn processor_table(&self, processors: &[ProcessorRef]) -> String {
        #[derive(Tabled)]
        struct ProcessorRow<'a> {
            #[tabled(rename = "#")]
            index: usize,
            class: &'a str,
            image: &'a str,
            module: &'a str,
            args: String,
        }

        let rows = processors.iter().enumerate().map(|(index, proc)| ProcessorRow {
            index: index + 1,
            class: &proc.class_name,
            image: &proc.image,
            module: proc.module.as_deref().unwrap_or("-"),
            args: serde_json::Value::Object(proc.args.clone()).to_string(),
        });
        Table::new(rows).with(Style::rounded()).to_string()
    }

    #[cfg(feature = "table-output")]
    fn module_table(&self, modules: &[PipelineModule]) -> String {
        #[derive(Tabled)]
        struct ModuleRow<'a> {
            name: &'a str,
            objective: &'a str,
            category: &'a str,
            ops: usize,
            standard: bool,
        }

        let rows = modules.iter().map(|module| ModuleRow {
            name: &module.name,
            objective: &module.module_type,
            category: &module.category,
            ops: module.ops.len(),
            standard: module.standard,
        });
        Table::new(rows).with(Style::rounded()).to_string()
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn resolved() -> ResolvedPipeline {
        let mut proc = ProcessorRef::new("Outer", "core").with_arg("ocr", true);
        proc.module = Some("ocr".to_string());
        ResolvedPipeline::new(
            vec![proc.with_execute(vec![ProcessorRef::new("Inner", "core")])],
            BTreeSet::from(["Text Detection (OCR)".to_string()]),
        )
    }

    #[test]
    fn test_pretty_lists_nested_processors() {
        let output = OutputManager::new(false)
            .format_resolved(&resolved(), OutputFormat::Pretty)
            .unwrap();
        assert!(output.contains("1. Outer [core] (ocr)"));
        assert!(output.contains("ocr: true"));
        assert!(output.contains("1. Inner [core]"));
        assert!(output.contains("Objectives: Text Detection (OCR)"));
    }

    #[test]
    fn test_json_compact_is_single_line() {
        let output = OutputManager::new(false)
            .format_resolved(&resolved(), OutputFormat::JsonCompact)
            .unwrap();
        assert!(!output.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["execute"][0]["className"], "Outer");
    }
}

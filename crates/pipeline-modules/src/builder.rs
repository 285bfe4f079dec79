//! Single-module rewrite step.
//!
//! A [`PipelineBuilder`] applies the ops of one module to a read-only base
//! pipeline. Ops are matched against every processor first, consuming their
//! budgets, and only then applied while walking the base in order. Insertions
//! that are not positional are collected into three buckets which are placed
//! once the walk is done: `prepend` at the prepend marker, `append` at the
//! end and `last` after that, ordered by contributing module.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::module::{ModOpAction, NotFilterSemantics, PipelineModule};
use crate::processor::ProcessorRef;
use crate::store::ModuleStore;
use crate::{Error, Result};

/// State shared by every builder run within one resolve call.
#[derive(Debug, Default)]
pub struct ResolveState {
    applied: HashSet<String>,
    /// Modules currently being applied, outermost first.
    stack: Vec<String>,
}

impl ResolveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_applied(&self, module: &str) -> bool {
        self.applied.contains(module)
    }

    /// Number of modules applied so far, dependencies included.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Output of one builder run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rewrite {
    /// The rewritten pipeline with all buckets placed.
    pub pipeline: Vec<ProcessorRef>,
    pub prepend: Vec<ProcessorRef>,
    pub append: Vec<ProcessorRef>,
    pub last: Vec<ProcessorRef>,
}

impl Rewrite {
    fn unchanged(base: &[ProcessorRef]) -> Self {
        Self {
            pipeline: base.to_vec(),
            ..Self::default()
        }
    }

    /// Take over the buckets of a dependency run. Its pipeline is discarded.
    fn absorb(&mut self, other: Rewrite) {
        self.prepend.extend(other.prepend);
        self.append.extend(other.append);
        self.last.extend(other.last);
    }

    fn place_buckets(&mut self) {
        if let Some(pos) = self
            .pipeline
            .iter()
            .position(ProcessorRef::is_prepend_marker)
        {
            let tail = self.pipeline.split_off(pos);
            self.pipeline.extend(self.prepend.iter().cloned());
            self.pipeline.extend(tail);
        }

        self.pipeline.extend(self.append.iter().cloned());

        self.last.sort_by(|a, b| a.module.cmp(&b.module));
        self.pipeline.extend(self.last.iter().cloned());
    }
}

/// Applies a single module to a base pipeline.
pub struct PipelineBuilder<'a> {
    base: &'a [ProcessorRef],
    store: &'a dyn ModuleStore,
    semantics: NotFilterSemantics,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(base: &'a [ProcessorRef], store: &'a dyn ModuleStore) -> Self {
        Self {
            base,
            store,
            semantics: NotFilterSemantics::default(),
        }
    }

    pub fn with_not_filter_semantics(mut self, semantics: NotFilterSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Apply `module` to the base pipeline.
    ///
    /// A module already applied in `state` leaves the base untouched and
    /// contributes nothing. Dependencies are fetched from the store and run
    /// against the same base; only their buckets are kept.
    pub fn apply_ops(
        &self,
        module: &mut PipelineModule,
        state: &mut ResolveState,
    ) -> Result<Rewrite> {
        if state.is_applied(&module.name) {
            debug!(module = %module.name, "Module already applied, skipping");
            return Ok(Rewrite::unchanged(self.base));
        }

        if let Some(pos) = state.stack.iter().position(|name| *name == module.name) {
            let mut chain = state.stack[pos..].to_vec();
            chain.push(module.name.clone());
            return Err(Error::DependencyCycle { chain });
        }

        state.stack.push(module.name.clone());
        let result = self.rewrite(module, state);
        state.stack.pop();

        let mut rewrite = result?;
        state.applied.insert(module.name.clone());
        rewrite.place_buckets();

        debug!(
            module = %module.name,
            steps = rewrite.pipeline.len(),
            prepend = rewrite.prepend.len(),
            append = rewrite.append.len(),
            last = rewrite.last.len(),
            "Applied module"
        );
        Ok(rewrite)
    }

    /// For each base processor, the indexes of the ops selected for it.
    fn select_ops(&self, module: &mut PipelineModule) -> Vec<Vec<usize>> {
        let PipelineModule { name, ops, .. } = module;

        self.base
            .iter()
            .map(|proc| {
                ops.iter_mut()
                    .enumerate()
                    .filter_map(|(index, op)| {
                        if !op.try_select(&proc.class_name, self.semantics) {
                            return None;
                        }
                        trace!(
                            module = %name,
                            op = %op.op_type(),
                            processor = %proc.class_name,
                            apply_count = op.apply_count(),
                            "Op matched"
                        );
                        Some(index)
                    })
                    .collect()
            })
            .collect()
    }

    fn rewrite(&self, module: &mut PipelineModule, state: &mut ResolveState) -> Result<Rewrite> {
        let selected = self.select_ops(module);
        let module = &*module;

        let mut refs = self.base.to_vec();
        let mut out = Rewrite::default();

        for (index, op_indexes) in selected.iter().enumerate() {
            if op_indexes.is_empty() {
                out.pipeline.push(refs[index].clone());
                continue;
            }

            let mut current = Some(refs[index].clone());
            let mut before = Vec::new();
            let mut replacement = Vec::new();
            let mut after = Vec::new();

            for &op_index in op_indexes {
                match &module.ops[op_index].action {
                    ModOpAction::AddAfter(frag) => after.extend(tagged(frag, module)),
                    ModOpAction::AddBefore(frag) => before.extend(tagged(frag, module)),
                    ModOpAction::Append(frag) => out.append.extend(tagged(frag, module)),
                    ModOpAction::Prepend(frag) => out.prepend.extend(tagged(frag, module)),
                    ModOpAction::Last(frag) => out.last.extend(tagged(frag, module)),
                    ModOpAction::AppendMerge(frag) => {
                        for proc in tagged(frag, module) {
                            let existing = match current.as_mut() {
                                Some(cur) if cur.is_same_processor(&proc) => Some(cur),
                                _ => out
                                    .pipeline
                                    .iter_mut()
                                    .chain(before.iter_mut())
                                    .chain(replacement.iter_mut())
                                    .chain(after.iter_mut())
                                    .chain(out.append.iter_mut())
                                    .chain(refs[index + 1..].iter_mut())
                                    .find(|p| p.is_same_processor(&proc)),
                            };
                            if let Some(target) = existing {
                                target.merge_args(&proc.args);
                            } else {
                                out.append.push(proc);
                            }
                        }
                    }
                    ModOpAction::Remove => current = None,
                    ModOpAction::Replace(frag) => {
                        current = None;
                        replacement.extend(tagged(frag, module));
                    }
                    ModOpAction::SetArgs(args) => {
                        if let Some(cur) = current.as_mut() {
                            cur.merge_args(args);
                        }
                    }
                    ModOpAction::Depend(names) => {
                        for mut dependency in self.store.get_by_names(names)? {
                            debug!(
                                module = %module.name,
                                dependency = %dependency.name,
                                "Expanding module dependency"
                            );
                            let sub = self.apply_ops(&mut dependency, state)?;
                            out.absorb(sub);
                        }
                    }
                }
            }

            out.pipeline.extend(before);
            out.pipeline.extend(current);
            out.pipeline.extend(replacement);
            out.pipeline.extend(after);
        }

        Ok(out)
    }
}

/// Copies of a fragment stamped with the contributing module.
fn tagged<'f>(
    fragment: &'f [ProcessorRef],
    module: &'f PipelineModule,
) -> impl Iterator<Item = ProcessorRef> + 'f {
    fragment.iter().map(|proc| {
        let mut proc = proc.clone();
        proc.tag(&module.name, module.force);
        proc
    })
}

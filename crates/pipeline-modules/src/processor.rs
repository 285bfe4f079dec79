//! Processor references: the unit of work a resolved pipeline is made of.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// String-keyed processor arguments.
pub type Args = Map<String, Value>;

/// Class name of the sentinel that anchors `PREPEND` insertions.
pub const PREPEND_MARKER_CLASS: &str = "PrependMarker";

/// Image of the prepend marker. The marker never runs.
pub const PREPEND_MARKER_IMAGE: &str = "none";

/// A single processing step.
///
/// Identity for matching and merging is the class name: two refs with the
/// same `class_name` are the same processor regardless of which module
/// produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorRef {
    /// Implementation class identifier.
    pub class_name: String,
    /// Container image the processor runs in.
    #[serde(alias = "container")]
    pub image: String,
    /// Processor arguments. Only ever overlaid, never pruned.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Map::is_empty"
    )]
    pub args: Args,
    /// Name of the module that contributed this processor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Propagated from a forced module.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
    /// Nested steps of a composite processor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute: Option<Vec<ProcessorRef>>,
}

impl ProcessorRef {
    /// Create a processor reference with no arguments.
    pub fn new(class_name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            image: image.into(),
            args: Args::new(),
            module: None,
            force: false,
            execute: None,
        }
    }

    /// The sentinel marking where `PREPEND` fragments are spliced in.
    pub fn prepend_marker() -> Self {
        Self::new(PREPEND_MARKER_CLASS, PREPEND_MARKER_IMAGE)
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_execute(mut self, execute: Vec<ProcessorRef>) -> Self {
        self.execute = Some(execute);
        self
    }

    pub fn is_prepend_marker(&self) -> bool {
        self.class_name == PREPEND_MARKER_CLASS
    }

    /// Whether `other` refers to the same processor.
    pub fn is_same_processor(&self, other: &ProcessorRef) -> bool {
        self.class_name == other.class_name
    }

    /// Overlay `args` onto this processor's arguments; later values win.
    pub fn merge_args(&mut self, args: &Args) {
        for (key, value) in args {
            self.args.insert(key.clone(), value.clone());
        }
    }

    /// Stamp the contributing module onto this processor.
    pub(crate) fn tag(&mut self, module: &str, force: bool) {
        self.module = Some(module.to_string());
        self.force = force;
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Args, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Args>::deserialize(deserializer)?.unwrap_or_default())
}

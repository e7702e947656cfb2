use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};
use crate::ir::OptionValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformCategory {
    Aggregate,
    ControlFlow,
    Scalar,
    DataSource,
    Math,
    Trend,
    Momentum,
    Volatility,
    Volume,
    PriceAction,
    Statistical,
    Factor,
    Utility,
    Executor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoDataType {
    Decimal,
    Integer,
    Number,
    Boolean,
    String,
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoMetadata {
    pub id: String,
    pub data_type: IoDataType,
    #[serde(default)]
    pub allow_multiple_connections: bool,
}

impl IoMetadata {
    pub fn new(id: impl Into<String>, data_type: IoDataType) -> Self {
        Self {
            id: id.into(),
            data_type,
            allow_multiple_connections: false,
        }
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple_connections = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionMetadata {
    pub id: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<OptionValue>,
}

/// Schema of one transform type: what it reads, what it publishes, and
/// which options it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformMetadata {
    pub id: String,
    pub name: String,
    pub category: TransformCategory,
    #[serde(default)]
    pub options: Vec<OptionMetadata>,
    #[serde(default)]
    pub inputs: Vec<IoMetadata>,
    #[serde(default)]
    pub outputs: Vec<IoMetadata>,
    #[serde(default)]
    pub at_least_one_input_required: bool,
    #[serde(default)]
    pub requires_timeframe: bool,
}

impl TransformMetadata {
    pub fn new(id: impl Into<String>, category: TransformCategory) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category,
            options: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            at_least_one_input_required: false,
            requires_timeframe: category != TransformCategory::Scalar,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn input(mut self, input: IoMetadata) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn output(mut self, id: impl Into<String>, data_type: IoDataType) -> Self {
        self.outputs.push(IoMetadata::new(id, data_type).multiple());
        self
    }

    pub fn required_option(mut self, id: impl Into<String>) -> Self {
        self.options.push(OptionMetadata {
            id: id.into(),
            required: true,
            default: None,
        });
        self
    }

    pub fn optional_option(mut self, id: impl Into<String>, default: impl Into<OptionValue>) -> Self {
        self.options.push(OptionMetadata {
            id: id.into(),
            required: false,
            default: Some(default.into()),
        });
        self
    }

    pub fn at_least_one_input(mut self) -> Self {
        self.at_least_one_input_required = true;
        self
    }

    pub fn is_executor(&self) -> bool {
        self.category == TransformCategory::Executor
    }

    pub fn has_output(&self, id: &str) -> bool {
        self.outputs.iter().any(|output| output.id == id)
    }
}

/// Type tag -> schema lookup, injected into manager construction.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: HashMap<String, TransformMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `metadata` under its id, returning any schema it replaced.
    pub fn register(&mut self, metadata: TransformMetadata) -> Option<TransformMetadata> {
        self.entries.insert(metadata.id.clone(), metadata)
    }

    pub fn get(&self, type_tag: &str) -> Option<&TransformMetadata> {
        self.entries.get(type_tag)
    }

    pub(crate) fn lookup(&self, type_tag: &str, node_id: &str) -> GraphResult<&TransformMetadata> {
        self.get(type_tag).ok_or_else(|| GraphError::UnknownType {
            type_tag: type_tag.to_string(),
            node_id: node_id.to_string(),
        })
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.entries.contains_key(type_tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn type_tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<TransformMetadata> for MetadataRegistry {
    fn from_iter<T: IntoIterator<Item = TransformMetadata>>(iter: T) -> Self {
        let mut registry = Self::new();
        for metadata in iter {
            registry.register(metadata);
        }
        registry
    }
}

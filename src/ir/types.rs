use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::timeframe::TimeFrame;

/// Compiled node list as delivered by the script compiler.
///
/// The node order is trusted to be topological.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompiledSource {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<AlgorithmNode>,
}

impl CompiledSource {
    pub fn new(nodes: Vec<AlgorithmNode>) -> Self {
        Self { name: None, nodes }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub options: HashMap<String, OptionValue>,
    #[serde(default)]
    pub inputs: HashMap<String, InputRef>,
    #[serde(default)]
    pub timeframe: Option<TimeFrame>,
}

impl AlgorithmNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            options: HashMap::new(),
            inputs: HashMap::new(),
            timeframe: None,
        }
    }

    pub fn with_input(mut self, slot: impl Into<String>, handle: impl Into<String>) -> Self {
        self.inputs.insert(slot.into(), InputRef::Single(handle.into()));
        self
    }

    pub fn with_inputs<I, S>(mut self, slot: impl Into<String>, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handles = handles.into_iter().map(Into::into).collect();
        self.inputs.insert(slot.into(), InputRef::Many(handles));
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_timeframe(mut self, timeframe: TimeFrame) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    /// All handles bound to any slot.
    pub fn input_handles(&self) -> Vec<String> {
        self.inputs
            .values()
            .flat_map(|input| input.handles().iter().cloned())
            .collect()
    }
}

/// Handles bound to one input slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputRef {
    Single(String),
    Many(Vec<String>),
}

impl InputRef {
    pub fn handles(&self) -> &[String] {
        match self {
            InputRef::Single(handle) => std::slice::from_ref(handle),
            InputRef::Many(handles) => handles,
        }
    }

    pub fn into_handles(self) -> Vec<String> {
        match self {
            InputRef::Single(handle) => vec![handle],
            InputRef::Many(handles) => handles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value as f64)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

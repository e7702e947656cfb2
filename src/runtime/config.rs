use serde::Serialize;
use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};
use crate::ir::{qualified_id, AlgorithmNode, OptionValue};
use crate::registry::TransformMetadata;
use crate::timeframe::TimeFrame;

/// One configured node of the transform graph.
///
/// `Clone` is a deep copy; merging managers relies on it so that no two
/// managers ever share a configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformConfiguration {
    id: String,
    #[serde(rename = "type")]
    type_tag: String,
    options: HashMap<String, OptionValue>,
    inputs: HashMap<String, Vec<String>>,
    timeframe: Option<TimeFrame>,
    metadata: TransformMetadata,
}

impl TransformConfiguration {
    /// Wraps a compiled node, checking its options and inputs against the
    /// type's schema.
    pub fn new(node: AlgorithmNode, timeframe: Option<TimeFrame>, metadata: TransformMetadata) -> GraphResult<Self> {
        for option in &metadata.options {
            if option.required && !node.options.contains_key(&option.id) {
                return Err(GraphError::MissingOption {
                    node_id: node.id,
                    type_tag: node.node_type,
                    option: option.id.clone(),
                });
            }
        }

        let mut connected = 0;
        for input in &metadata.inputs {
            if node.inputs.contains_key(&input.id) {
                connected += 1;
            } else if !metadata.at_least_one_input_required {
                return Err(GraphError::MissingInput {
                    node_id: node.id,
                    type_tag: node.node_type,
                    slot: input.id.clone(),
                });
            }
        }
        if connected == 0 && metadata.at_least_one_input_required && !node.inputs.is_empty() {
            return Err(GraphError::NoInputsConnected {
                node_id: node.id,
                type_tag: node.node_type,
            });
        }

        let inputs = node
            .inputs
            .into_iter()
            .map(|(slot, input)| (slot, input.into_handles()))
            .collect();

        Ok(Self {
            id: node.id,
            type_tag: node.node_type,
            options: node.options,
            inputs,
            timeframe,
            metadata,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn timeframe(&self) -> Option<&TimeFrame> {
        self.timeframe.as_ref()
    }

    pub fn metadata(&self) -> &TransformMetadata {
        &self.metadata
    }

    pub fn is_executor(&self) -> bool {
        self.metadata.is_executor()
    }

    pub fn options(&self) -> &HashMap<String, OptionValue> {
        &self.options
    }

    /// Option value set on the node, else the schema default.
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key).or_else(|| {
            self.metadata
                .options
                .iter()
                .find(|option| option.id == key)
                .and_then(|option| option.default.as_ref())
        })
    }

    pub fn inputs(&self) -> &HashMap<String, Vec<String>> {
        &self.inputs
    }

    /// Every bound handle, across all slots.
    pub fn input_handles(&self) -> impl Iterator<Item = &str> {
        self.inputs.values().flatten().map(String::as_str)
    }

    /// Handles bound to `slot`, empty when the slot is unbound.
    pub fn qualified_input_ids(&self, slot: &str) -> &[String] {
        self.inputs.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single handle bound to `slot`.
    pub fn qualified_input_id(&self, slot: &str) -> GraphResult<&str> {
        let handles = self
            .inputs
            .get(slot)
            .ok_or_else(|| GraphError::not_found(format!("{}.{slot}", self.id)))?;
        match handles.as_slice() {
            [handle] => Ok(handle.as_str()),
            _ => Err(GraphError::Ambiguous {
                node_id: self.id.clone(),
                what: format!("handle on slot '{slot}'"),
                count: handles.len(),
            }),
        }
    }

    pub fn has_output(&self, output: &str) -> bool {
        self.metadata.has_output(output)
    }

    pub fn qualified_output_id(&self, output: &str) -> GraphResult<String> {
        if !self.has_output(output) {
            return Err(GraphError::UnknownOutput {
                node_id: self.id.clone(),
                output: output.to_string(),
            });
        }
        Ok(qualified_id(&self.id, output))
    }

    /// Qualified id of the sole output.
    pub fn output_id(&self) -> GraphResult<String> {
        match self.metadata.outputs.as_slice() {
            [output] => Ok(qualified_id(&self.id, &output.id)),
            outputs => Err(GraphError::Ambiguous {
                node_id: self.id.clone(),
                what: "output".to_string(),
                count: outputs.len(),
            }),
        }
    }

    /// Qualified ids of every declared output, in schema order.
    pub fn output_ids(&self) -> Vec<String> {
        self.metadata
            .outputs
            .iter()
            .map(|output| qualified_id(&self.id, &output.id))
            .collect()
    }
}

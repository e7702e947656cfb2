use anyhow::Result;
use std::collections::HashMap;
use std::fmt;

use crate::error::{GraphError, GraphResult};
use crate::runtime::TransformConfiguration;

/// Columns keyed by name. Kernels read qualified ids and return columns
/// keyed by their local output names.
pub type ColumnTable = HashMap<String, Vec<f64>>;

/// One executable kernel instance built from a configuration.
pub trait ExecutableTransform: Send {
    fn configuration(&self) -> &TransformConfiguration;
    fn execute(&mut self, input: &ColumnTable) -> Result<ColumnTable>;
}

pub type TransformConstructor =
    Box<dyn Fn(&TransformConfiguration) -> Result<Box<dyn ExecutableTransform>> + Send + Sync>;

/// Type tag -> kernel constructor.
#[derive(Default)]
pub struct TransformFactory {
    constructors: HashMap<String, TransformConstructor>,
}

impl TransformFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_tag: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&TransformConfiguration) -> Result<Box<dyn ExecutableTransform>> + Send + Sync + 'static,
    {
        self.constructors.insert(type_tag.into(), Box::new(constructor));
        self
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    pub fn create(&self, config: &TransformConfiguration) -> GraphResult<Box<dyn ExecutableTransform>> {
        let constructor = self
            .constructors
            .get(config.type_tag())
            .ok_or_else(|| GraphError::MissingFactory {
                type_tag: config.type_tag().to_string(),
            })?;
        constructor(config).map_err(|err| GraphError::construct(config.id(), err))
    }
}

impl fmt::Debug for TransformFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.constructors.keys().collect();
        tags.sort();
        f.debug_struct("TransformFactory").field("types", &tags).finish()
    }
}

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, error, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::ir::{handle, AlgorithmNode, CompiledSource};
use crate::registry::{ExecutableTransform, MetadataRegistry, TransformFactory};
use crate::runtime::config::TransformConfiguration;
use crate::runtime::resolve::TimeframeResolutionCache;
use crate::timeframe::TimeFrame;

/// How a compiled source is turned into a manager.
#[derive(Debug, Clone)]
pub struct TransformManagerOptions {
    pub source: CompiledSource,
    /// With a non-base `timeframe`, discard every node's explicit timeframe.
    pub strict: bool,
    /// Treat `timeframe` as a fallback only, never as an override.
    pub timeframe_is_base: bool,
    pub timeframe: Option<TimeFrame>,
    /// Run [`TransformManager::validate`] after construction.
    pub validate: bool,
}

impl Default for TransformManagerOptions {
    fn default() -> Self {
        Self {
            source: CompiledSource::default(),
            strict: true,
            timeframe_is_base: false,
            timeframe: None,
            validate: false,
        }
    }
}

impl TransformManagerOptions {
    pub fn new(source: CompiledSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    pub fn with_timeframe(mut self, timeframe: TimeFrame) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn timeframe_is_base(mut self, is_base: bool) -> Self {
        self.timeframe_is_base = is_base;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn overrides_explicit_timeframes(&self) -> bool {
        self.strict && self.timeframe.is_some() && !self.timeframe_is_base
    }
}

/// Read-only view of a compiled transform graph, shared by the manager,
/// orchestrators, and test doubles.
pub trait TransformGraph {
    /// Configurations in execution order.
    fn transforms(&self) -> &[TransformConfiguration];

    fn get_by_id(&self, id: &str) -> GraphResult<&TransformConfiguration>;

    fn get_executor(&self) -> GraphResult<&TransformConfiguration>;

    /// One fresh kernel per configuration, in execution order.
    fn build_transforms(&self, factory: &TransformFactory) -> GraphResult<Vec<Box<dyn ExecutableTransform>>> {
        self.transforms().iter().map(|config| factory.create(config)).collect()
    }
}

/// Ordered registry of the configured nodes of one compiled graph.
///
/// Configurations live in insertion order, which is the execution order.
/// The id and output indices hold positions into that list.
#[derive(Debug, Clone, Default)]
pub struct TransformManager {
    configurations: Vec<TransformConfiguration>,
    by_id: HashMap<String, usize>,
    by_output_id: HashMap<String, usize>,
    executor_id: Option<String>,
}

impl TransformManager {
    pub fn new(options: TransformManagerOptions, registry: &MetadataRegistry) -> GraphResult<Self> {
        let reset_explicit = options.overrides_explicit_timeframes();
        let TransformManagerOptions {
            source,
            timeframe: base,
            validate,
            ..
        } = options;

        let mut nodes = source.nodes;
        if reset_explicit {
            debug!(timeframe = ?base.as_ref().map(ToString::to_string), "strict override clears explicit timeframes");
            for node in &mut nodes {
                node.timeframe = None;
            }
        }
        log_duplicate_ids(&nodes);

        let mut manager = Self::default();
        let mut cache = TimeframeResolutionCache::new();
        for node in nodes {
            let metadata = registry.lookup(&node.node_type, &node.id)?.clone();
            let timeframe = cache.resolve_node(&node, base.as_ref());
            if timeframe.is_none() && metadata.requires_timeframe {
                warn!(node = %node.id, kind = %node.node_type, "no timeframe could be resolved");
            }

            let is_executor = metadata.is_executor();
            let config = TransformConfiguration::new(node, timeframe, metadata)?;
            let id = manager.insert(config)?.id().to_string();

            if is_executor {
                if let Some(first) = manager.executor_id.take() {
                    return Err(GraphError::DuplicateExecutor { first, second: id });
                }
                manager.executor_id = Some(id);
            }
        }

        info!(
            source = source.name.as_deref().unwrap_or("<unnamed>"),
            transforms = manager.len(),
            executor = manager.executor_id.as_deref().unwrap_or("<none>"),
            "built transform manager"
        );

        if validate {
            manager.validate()?;
        }
        Ok(manager)
    }

    /// Appends `config`, indexing its id and qualified outputs.
    ///
    /// A duplicate id, or one containing the handle delimiter, is rejected
    /// and leaves the manager untouched.
    pub fn insert(&mut self, config: TransformConfiguration) -> GraphResult<&TransformConfiguration> {
        check_id(config.id())?;
        if self.by_id.contains_key(config.id()) {
            error!(
                id = config.id(),
                count = self.configurations.len(),
                "duplicate transform registration"
            );
            return Err(GraphError::DuplicateId {
                id: config.id().to_string(),
                count: self.configurations.len(),
            });
        }

        let index = self.configurations.len();
        self.by_id.insert(config.id().to_string(), index);
        for output_id in config.output_ids() {
            self.by_output_id.insert(output_id, index);
        }
        self.configurations.push(config);
        Ok(&self.configurations[index])
    }

    /// Deep-copies every configuration of `other` into `self`, in order.
    ///
    /// Fails without modifying `self` if any id would be registered twice or
    /// the result would hold two executors. The executor of `other` is
    /// adopted when `self` has none.
    pub fn merge(&mut self, other: &dyn TransformGraph) -> GraphResult<()> {
        let mut seen = HashSet::with_capacity(other.transforms().len());
        let mut executor_id = self.executor_id.clone();
        for config in other.transforms() {
            check_id(config.id())?;
            if self.by_id.contains_key(config.id()) || !seen.insert(config.id()) {
                error!(id = config.id(), "merge would register a duplicate transform");
                return Err(GraphError::DuplicateId {
                    id: config.id().to_string(),
                    count: self.configurations.len(),
                });
            }
            if config.is_executor() {
                if let Some(first) = &executor_id {
                    return Err(GraphError::DuplicateExecutor {
                        first: first.clone(),
                        second: config.id().to_string(),
                    });
                }
                executor_id = Some(config.id().to_string());
            }
        }

        for config in other.transforms() {
            self.insert(config.clone())?;
        }
        self.executor_id = executor_id;
        debug!(merged = other.transforms().len(), total = self.len(), "merged transform graph");
        Ok(())
    }

    pub fn transforms(&self) -> &[TransformConfiguration] {
        &self.configurations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransformConfiguration> {
        self.configurations.iter()
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get_by_id(&self, id: &str) -> GraphResult<&TransformConfiguration> {
        self.position(id)
            .map(|index| &self.configurations[index])
            .ok_or_else(|| GraphError::not_found(id))
    }

    pub fn get_by_output_id(&self, output_id: &str) -> GraphResult<&TransformConfiguration> {
        self.by_output_id
            .get(output_id)
            .map(|&index| &self.configurations[index])
            .ok_or_else(|| GraphError::not_found(output_id))
    }

    /// Finds the producer of `handle` and the output it names. A bare node
    /// id names that node's sole output.
    pub fn resolve_handle<'a>(&'a self, handle: &'a str) -> GraphResult<(&'a TransformConfiguration, &'a str)> {
        match handle::split(handle) {
            (_, Some(output)) => Ok((self.get_by_output_id(handle)?, output)),
            (node_id, None) => {
                let config = self.get_by_id(node_id)?;
                match config.metadata().outputs.as_slice() {
                    [output] => Ok((config, output.id.as_str())),
                    outputs => Err(GraphError::Ambiguous {
                        node_id: node_id.to_string(),
                        what: "output".to_string(),
                        count: outputs.len(),
                    }),
                }
            }
        }
    }

    pub fn executor_id(&self) -> Option<&str> {
        self.executor_id.as_deref()
    }

    pub fn get_executor(&self) -> GraphResult<&TransformConfiguration> {
        let id = self.executor_id.as_deref().ok_or(GraphError::MissingExecutor)?;
        self.get_by_id(id)
    }

    /// Distinct resolved timeframes, finest first.
    pub fn timeframes(&self) -> BTreeSet<TimeFrame> {
        self.configurations
            .iter()
            .filter_map(|config| config.timeframe().cloned())
            .collect()
    }

    pub fn build_transforms(&self, factory: &TransformFactory) -> GraphResult<Vec<Box<dyn ExecutableTransform>>> {
        let transforms = TransformGraph::build_transforms(self, factory)?;
        debug!(count = transforms.len(), "materialized transforms");
        Ok(transforms)
    }
}

impl TransformGraph for TransformManager {
    fn transforms(&self) -> &[TransformConfiguration] {
        &self.configurations
    }

    fn get_by_id(&self, id: &str) -> GraphResult<&TransformConfiguration> {
        TransformManager::get_by_id(self, id)
    }

    fn get_executor(&self) -> GraphResult<&TransformConfiguration> {
        TransformManager::get_executor(self)
    }
}

impl<'a> IntoIterator for &'a TransformManager {
    type Item = &'a TransformConfiguration;
    type IntoIter = std::slice::Iter<'a, TransformConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Node ids must not contain the handle delimiter, or handles naming them
/// would split at the wrong place.
fn check_id(id: &str) -> GraphResult<()> {
    if id.contains(handle::HANDLE_DELIMITER) {
        error!(id, "transform id contains the handle delimiter");
        return Err(GraphError::InvalidHandle(id.to_string()));
    }
    Ok(())
}

fn log_duplicate_ids(nodes: &[AlgorithmNode]) {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            error!(
                id = %node.id,
                kind = %node.node_type,
                "duplicate node id in compilation result"
            );
        }
    }
}

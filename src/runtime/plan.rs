//! Execution boundary.
//!
//! An orchestrator runs the graph once per distinct (timeframe, asset) pair.
//! Within one run, configurations are visited in manager order and each
//! writes its outputs under its qualified output ids into one shared table.
//! Kernel instances carry per-run state, so every run gets its own set.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::registry::{ColumnTable, ExecutableTransform, TransformFactory};
use crate::runtime::manager::TransformGraph;
use crate::timeframe::TimeFrame;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionKey {
    pub timeframe: TimeFrame,
    pub asset: String,
}

impl ExecutionKey {
    pub fn new(timeframe: TimeFrame, asset: impl Into<String>) -> Self {
        Self {
            timeframe,
            asset: asset.into(),
        }
    }
}

impl fmt::Display for ExecutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.timeframe, self.asset)
    }
}

/// Kernels materialized for one execution key.
pub struct KernelSet {
    pub key: ExecutionKey,
    pub kernels: Vec<Box<dyn ExecutableTransform>>,
}

/// Which configurations run for which (timeframe, asset) pair.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Per timeframe, ids in manager order. Timeframe-agnostic
    /// configurations are part of every stage.
    stages: BTreeMap<TimeFrame, Vec<String>>,
    agnostic: Vec<String>,
    assets: BTreeSet<String>,
}

impl ExecutionPlan {
    /// Groups `graph` by resolved timeframe. A graph in which nothing
    /// resolved to a timeframe has no stages and therefore no keys.
    pub fn new<G, I, S>(graph: &G, assets: I) -> Self
    where
        G: TransformGraph + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let configs = graph.transforms();
        let timeframes: BTreeSet<_> = configs.iter().filter_map(|c| c.timeframe().cloned()).collect();

        let stages = timeframes
            .into_iter()
            .map(|timeframe| {
                let ids = configs
                    .iter()
                    .filter(|c| c.timeframe().map_or(true, |tf| *tf == timeframe))
                    .map(|c| c.id().to_string())
                    .collect();
                (timeframe, ids)
            })
            .collect();
        let agnostic = configs
            .iter()
            .filter(|c| c.timeframe().is_none())
            .map(|c| c.id().to_string())
            .collect();

        let plan = Self {
            stages,
            agnostic,
            assets: assets.into_iter().map(Into::into).collect(),
        };
        if plan.stages.is_empty() && !plan.agnostic.is_empty() {
            warn!(
                transforms = plan.agnostic.len(),
                "no transform resolved to a timeframe; the plan has no runs"
            );
        }
        plan
    }

    /// Every (timeframe, asset) pair, timeframes finest first.
    pub fn keys(&self) -> Vec<ExecutionKey> {
        self.stages
            .keys()
            .flat_map(|timeframe| {
                self.assets
                    .iter()
                    .map(move |asset| ExecutionKey::new(timeframe.clone(), asset.clone()))
            })
            .collect()
    }

    /// Ids run at `timeframe`, in manager order.
    pub fn stage(&self, timeframe: &TimeFrame) -> &[String] {
        self.stages.get(timeframe).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids that resolved to no timeframe.
    pub fn timeframe_agnostic(&self) -> &[String] {
        &self.agnostic
    }

    pub fn timeframes(&self) -> impl Iterator<Item = &TimeFrame> {
        self.stages.keys()
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(String::as_str)
    }

    /// Builds a fresh kernel set for every key, in parallel.
    pub fn materialize<G>(&self, graph: &G, factory: &TransformFactory) -> GraphResult<Vec<KernelSet>>
    where
        G: TransformGraph + Sync + ?Sized,
    {
        self.keys()
            .into_par_iter()
            .map(|key| {
                let kernels = self
                    .stage(&key.timeframe)
                    .iter()
                    .map(|id| factory.create(graph.get_by_id(id)?))
                    .collect::<GraphResult<Vec<_>>>()?;
                debug!(key = %key, kernels = kernels.len(), "materialized kernel set");
                Ok(KernelSet { key, kernels })
            })
            .collect()
    }

    /// Runs every key against its input table, keys in parallel.
    pub fn execute<G>(
        &self,
        graph: &G,
        factory: &TransformFactory,
        mut inputs: HashMap<ExecutionKey, ColumnTable>,
    ) -> GraphResult<HashMap<ExecutionKey, ColumnTable>>
    where
        G: TransformGraph + Sync + ?Sized,
    {
        let mut jobs = Vec::new();
        for set in self.materialize(graph, factory)? {
            let table = inputs
                .remove(&set.key)
                .ok_or_else(|| GraphError::not_found(set.key.to_string()))?;
            jobs.push((set, table));
        }

        let results = jobs
            .into_par_iter()
            .map(|(mut set, mut table)| {
                run_pipeline(&mut set.kernels, &mut table)?;
                Ok((set.key, table))
            })
            .collect::<GraphResult<HashMap<_, _>>>()?;
        info!(runs = results.len(), "executed transform graph");
        Ok(results)
    }
}

/// Runs one key's kernels in order against `table`.
///
/// Bound handles are looked up verbatim and must already be columns of the
/// table. Each output is stored under its qualified id; outputs the schema
/// does not declare are rejected.
pub fn run_pipeline(kernels: &mut [Box<dyn ExecutableTransform>], table: &mut ColumnTable) -> GraphResult<()> {
    for kernel in kernels.iter_mut() {
        let id = kernel.configuration().id().to_string();
        if let Some(missing) = kernel
            .configuration()
            .input_handles()
            .find(|handle| !table.contains_key(*handle))
        {
            return Err(GraphError::not_found(missing));
        }

        let outputs = kernel.execute(table).map_err(|err| GraphError::kernel(&id, err))?;
        for (name, column) in outputs {
            let qualified = kernel.configuration().qualified_output_id(&name)?;
            table.insert(qualified, column);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AlgorithmNode, CompiledSource};
    use crate::registry::MetadataRegistry;
    use crate::runtime::{TransformConfiguration, TransformManager, TransformManagerOptions};
    use anyhow::Result;

    /// Adds one to its `SLOT` column.
    struct Increment {
        config: TransformConfiguration,
    }

    impl ExecutableTransform for Increment {
        fn configuration(&self) -> &TransformConfiguration {
            &self.config
        }

        fn execute(&mut self, input: &ColumnTable) -> Result<ColumnTable> {
            let handle = self.config.qualified_input_id("SLOT")?;
            let column = input
                .get(handle)
                .ok_or_else(|| anyhow::anyhow!("missing column {handle}"))?;
            Ok([("result".to_string(), column.iter().map(|v| v + 1.0).collect())]
                .into_iter()
                .collect())
        }
    }

    fn factory() -> TransformFactory {
        let mut factory = TransformFactory::new();
        factory.register("sma", |config| {
            Ok(Box::new(Increment { config: config.clone() }) as Box<dyn ExecutableTransform>)
        });
        factory
    }

    fn tf(s: &str) -> TimeFrame {
        s.parse().unwrap()
    }

    fn manager() -> TransformManager {
        let source = CompiledSource::new(vec![
            AlgorithmNode::new("a", "sma")
                .with_input("SLOT", "c")
                .with_timeframe(tf("1H")),
            AlgorithmNode::new("b", "sma").with_input("SLOT", "a#result"),
            AlgorithmNode::new("d", "sma")
                .with_input("SLOT", "c")
                .with_timeframe(tf("1D")),
        ]);
        TransformManager::new(
            TransformManagerOptions::new(source).strict(false),
            &MetadataRegistry::with_builtins(),
        )
        .unwrap()
    }

    #[test]
    fn test_keys_cover_timeframes_and_assets() {
        let plan = ExecutionPlan::new(&manager(), ["MSFT", "AAPL", "MSFT"]);
        let keys: Vec<_> = plan.keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["1H/AAPL", "1H/MSFT", "1D/AAPL", "1D/MSFT"]);
        assert_eq!(plan.stage(&tf("1H")), ["a", "b"]);
        assert_eq!(plan.stage(&tf("1D")), ["d"]);
        assert!(plan.stage(&tf("1W")).is_empty());
        assert!(plan.timeframe_agnostic().is_empty());
    }

    #[test]
    fn test_materialize_gives_each_key_its_own_kernels() {
        let manager = manager();
        let plan = ExecutionPlan::new(&manager, ["AAPL", "MSFT"]);
        let sets = plan.materialize(&manager, &factory()).unwrap();

        assert_eq!(sets.len(), 4);
        assert_eq!(sets[0].key, ExecutionKey::new(tf("1H"), "AAPL"));
        let ids: Vec<_> = sets[0].kernels.iter().map(|k| k.configuration().id()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_materialize_fails_without_factory_entry() {
        let manager = manager();
        let plan = ExecutionPlan::new(&manager, ["AAPL"]);
        let err = plan.materialize(&manager, &TransformFactory::new()).err().unwrap();
        assert!(matches!(err, GraphError::MissingFactory { ref type_tag } if type_tag == "sma"));
    }

    #[test]
    fn test_run_pipeline_writes_qualified_outputs() {
        let manager = manager();
        let plan = ExecutionPlan::new(&manager, ["AAPL"]);
        let key = ExecutionKey::new(tf("1H"), "AAPL");
        let mut sets = plan.materialize(&manager, &factory()).unwrap();
        let set = sets.iter_mut().find(|s| s.key == key).unwrap();

        let mut table: ColumnTable = [("c".to_string(), vec![1.0, 2.0])].into_iter().collect();
        run_pipeline(&mut set.kernels, &mut table).unwrap();

        assert_eq!(table["a#result"], [2.0, 3.0]);
        assert_eq!(table["b#result"], [3.0, 4.0]);
        assert!(!table.contains_key("d#result"));
    }

    #[test]
    fn test_run_pipeline_requires_bound_columns() {
        let manager = manager();
        let mut kernels = manager.build_transforms(&factory()).unwrap();
        let mut table = ColumnTable::new();
        let err = run_pipeline(&mut kernels, &mut table).unwrap_err();
        assert!(matches!(err, GraphError::NotFound { ref key } if key == "c"));
    }

    #[test]
    fn test_execute_runs_every_key() {
        let manager = manager();
        let plan = ExecutionPlan::new(&manager, ["AAPL"]);
        let inputs: HashMap<ExecutionKey, ColumnTable> = plan
            .keys()
            .into_iter()
            .map(|key| (key, [("c".to_string(), vec![10.0])].into_iter().collect()))
            .collect();

        let outputs = plan.execute(&manager, &factory(), inputs).unwrap();
        assert_eq!(outputs[&ExecutionKey::new(tf("1H"), "AAPL")]["b#result"], [12.0]);
        assert_eq!(outputs[&ExecutionKey::new(tf("1D"), "AAPL")]["d#result"], [11.0]);
    }

    #[test]
    fn test_execute_needs_a_table_per_key() {
        let manager = manager();
        let plan = ExecutionPlan::new(&manager, ["AAPL"]);
        let err = plan.execute(&manager, &factory(), HashMap::new()).unwrap_err();
        assert!(matches!(err, GraphError::NotFound { .. }));
    }

    #[test]
    fn test_fully_agnostic_graph_has_no_runs() {
        let source = CompiledSource::new(vec![
            AlgorithmNode::new("a", "sma").with_input("SLOT", "c"),
            AlgorithmNode::new("b", "sma").with_input("SLOT", "a#result"),
        ]);
        let manager =
            TransformManager::new(TransformManagerOptions::new(source), &MetadataRegistry::with_builtins()).unwrap();
        let plan = ExecutionPlan::new(&manager, ["AAPL"]);

        assert!(plan.keys().is_empty());
        assert_eq!(plan.timeframes().count(), 0);
        assert_eq!(plan.timeframe_agnostic(), ["a", "b"]);
    }
}

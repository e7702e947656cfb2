//! Tests for execution planning across timeframes and assets

use anyhow::Result;
use std::collections::HashMap;
use transform_graph::registry::{ColumnTable, ExecutableTransform, MetadataRegistry, TransformFactory};
use transform_graph::{
    CompiledSource, ExecutionKey, ExecutionPlan, TimeFrame, TransformConfiguration, TransformManager,
    TransformManagerOptions,
};

const STRATEGY: &str = r#"{
    "name": "two speed",
    "nodes": [
        { "id": "hourly", "type": "market_data_source", "timeframe": "1H" },
        { "id": "daily", "type": "market_data_source", "timeframe": "1D" },
        { "id": "threshold", "type": "number", "options": { "value": 50 } },
        { "id": "rsi", "type": "rsi", "inputs": { "SLOT": "hourly#c" } },
        { "id": "trend", "type": "sma", "options": { "period": 20 }, "inputs": { "SLOT": "daily#c" } },
        { "id": "oversold", "type": "lt", "inputs": { "SLOT0": "rsi#result", "SLOT1": "threshold#result" } },
        { "id": "uptrend", "type": "gt", "inputs": { "SLOT0": "daily#c", "SLOT1": "trend#result" } },
        { "id": "entry", "type": "logical_and", "inputs": { "SLOT0": "oversold#result", "SLOT1": "uptrend#result" } },
        { "id": "exec", "type": "trade_signal_executor", "inputs": { "enter_long": "entry#result" } }
    ]
}"#;

fn manager() -> TransformManager {
    let source = CompiledSource::from_json(STRATEGY).unwrap();
    TransformManager::new(
        TransformManagerOptions::new(source).validate(true),
        &MetadataRegistry::with_builtins(),
    )
    .unwrap()
}

fn tf(s: &str) -> TimeFrame {
    s.parse().unwrap()
}

/// Emits a column of ones for every declared output.
struct Ones(TransformConfiguration);

impl ExecutableTransform for Ones {
    fn configuration(&self) -> &TransformConfiguration {
        &self.0
    }

    fn execute(&mut self, _input: &ColumnTable) -> Result<ColumnTable> {
        Ok(self
            .0
            .metadata()
            .outputs
            .iter()
            .map(|output| (output.id.clone(), vec![1.0]))
            .collect())
    }
}

fn factory(manager: &TransformManager) -> TransformFactory {
    let mut factory = TransformFactory::new();
    for config in manager.iter() {
        factory.register(config.type_tag(), |c| Ok(Box::new(Ones(c.clone())) as Box<dyn ExecutableTransform>));
    }
    factory
}

#[test]
fn test_mixed_timeframes_resolve_to_coarsest() {
    let manager = manager();
    let timeframe = |id: &str| manager.get_by_id(id).unwrap().timeframe().cloned();

    assert_eq!(timeframe("rsi"), Some(tf("1H")));
    assert_eq!(timeframe("trend"), Some(tf("1D")));
    assert_eq!(timeframe("threshold"), None);
    assert_eq!(timeframe("oversold"), Some(tf("1H")));
    assert_eq!(timeframe("entry"), Some(tf("1D")));
    assert_eq!(timeframe("exec"), Some(tf("1D")));
}

#[test]
fn test_plan_groups_by_timeframe() {
    let manager = manager();
    let plan = ExecutionPlan::new(&manager, ["BTC", "ETH"]);

    assert_eq!(plan.timeframes().cloned().collect::<Vec<_>>(), [tf("1H"), tf("1D")]);
    assert_eq!(plan.stage(&tf("1H")), ["hourly", "threshold", "rsi", "oversold"]);
    assert_eq!(
        plan.stage(&tf("1D")),
        ["daily", "threshold", "trend", "uptrend", "entry", "exec"]
    );
    assert_eq!(plan.timeframe_agnostic(), ["threshold"]);
    assert_eq!(plan.keys().len(), 4);
}

#[test]
fn test_execute_fills_each_key_table() {
    let manager = manager();
    let plan = ExecutionPlan::new(&manager, ["BTC"]);
    let mut inputs: HashMap<ExecutionKey, ColumnTable> = plan
        .keys()
        .into_iter()
        .map(|key| (key, ColumnTable::new()))
        .collect();
    // Columns from a finer run are resampled into the coarser table by the caller.
    inputs
        .get_mut(&ExecutionKey::new(tf("1D"), "BTC"))
        .unwrap()
        .insert("oversold#result".to_string(), vec![1.0]);

    let outputs = plan.execute(&manager, &factory(&manager), inputs).unwrap();
    let daily = &outputs[&ExecutionKey::new(tf("1D"), "BTC")];
    assert!(daily.contains_key("entry#result"));
    assert!(daily.contains_key("exec#enter_long"));
    assert!(!daily.contains_key("rsi#result"));

    let hourly = &outputs[&ExecutionKey::new(tf("1H"), "BTC")];
    assert!(hourly.contains_key("oversold#result"));
    assert!(!hourly.contains_key("entry#result"));
}

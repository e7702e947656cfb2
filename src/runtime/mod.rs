pub mod config;
pub mod manager;
pub mod plan;
pub mod resolve;
mod validate;

pub use config::TransformConfiguration;
pub use manager::{TransformGraph, TransformManager, TransformManagerOptions};
pub use plan::{run_pipeline, ExecutionKey, ExecutionPlan, KernelSet};
pub use resolve::TimeframeResolutionCache;

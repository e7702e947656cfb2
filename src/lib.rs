pub mod cli;
pub mod error;
pub mod ir;
pub mod registry;
pub mod runtime;
pub mod timeframe;

pub use error::{GraphError, GraphResult};
pub use ir::{AlgorithmNode, CompiledSource, InputRef, OptionValue};
pub use registry::{ExecutableTransform, MetadataRegistry, TransformFactory, TransformMetadata};
pub use runtime::{
    ExecutionKey, ExecutionPlan, TimeframeResolutionCache, TransformConfiguration, TransformGraph,
    TransformManager, TransformManagerOptions,
};
pub use timeframe::TimeFrame;

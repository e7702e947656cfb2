pub mod catalog;
pub mod factory;
pub mod metadata;

pub use catalog::{builtin_metadata, MARKET_DATA_SOURCE_ID, TRADE_SIGNAL_EXECUTOR_ID};
pub use factory::{ColumnTable, ExecutableTransform, TransformConstructor, TransformFactory};
pub use metadata::{
    IoDataType, IoMetadata, MetadataRegistry, OptionMetadata, TransformCategory, TransformMetadata,
};

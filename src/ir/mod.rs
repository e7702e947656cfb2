pub mod handle;
pub mod types;

pub use handle::{producer_id, qualified_id, HANDLE_DELIMITER};
pub use types::{AlgorithmNode, CompiledSource, InputRef, OptionValue};

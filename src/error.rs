use thiserror::Error;

/// Failures raised while compiling, querying, or materializing a transform graph.
///
/// Every variant is fatal for the operation that produced it: manager
/// construction, `merge`, and `build_transforms` are all-or-nothing.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("transform is already registered as '{id}' ({count} transforms registered)")]
    DuplicateId { id: String, count: usize },

    #[error("invalid transform type '{type_tag}' for node '{node_id}'")]
    UnknownType { type_tag: String, node_id: String },

    #[error("no factory registered for transform type '{type_tag}'")]
    MissingFactory { type_tag: String },

    #[error("no executor is set")]
    MissingExecutor,

    #[error("strategy declares more than one executor: '{first}' and '{second}'")]
    DuplicateExecutor { first: String, second: String },

    #[error("failed to find transform configuration for '{key}'")]
    NotFound { key: String },

    #[error("'{node_id}' has no output named '{output}'")]
    UnknownOutput { node_id: String, output: String },

    #[error("'{node_id}' expected exactly one {what} but found {count}")]
    Ambiguous {
        node_id: String,
        what: String,
        count: usize,
    },

    #[error("missing option '{option}' for '{type_tag}' (node '{node_id}')")]
    MissingOption {
        node_id: String,
        type_tag: String,
        option: String,
    },

    #[error("'{type_tag}' is missing input '{slot}' (node '{node_id}')")]
    MissingInput {
        node_id: String,
        type_tag: String,
        slot: String,
    },

    #[error("found no inputs for '{type_tag}' (node '{node_id}'), but at least 1 input was required")]
    NoInputsConnected { node_id: String, type_tag: String },

    #[error("invalid timeframe: '{0}'")]
    InvalidTimeFrame(String),

    #[error("invalid handle: '{0}'")]
    InvalidHandle(String),

    #[error("'{node_id}' reads '{handle}' before its producer has been registered")]
    ForwardReference { node_id: String, handle: String },

    #[error("transform graph contains a cycle through '{node_id}'")]
    Cycle { node_id: String },

    #[error("failed to construct transform '{id}'")]
    Construct {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("transform '{id}' failed")]
    Kernel {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl GraphError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub(crate) fn construct(id: &str, err: anyhow::Error) -> Self {
        Self::Construct {
            id: id.to_string(),
            source: err.into(),
        }
    }

    pub(crate) fn kernel(id: &str, err: anyhow::Error) -> Self {
        Self::Kernel {
            id: id.to_string(),
            source: err.into(),
        }
    }
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

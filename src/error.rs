use thiserror::Error;

/// Configuration errors. All of these are fatal and detected before any
/// command is dispatched. Remote execution failures are not errors at this
/// level; they are reported per node and isolated.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Invalid experiment name '{0}': only letters, digits, and underscores are allowed")]
    InvalidExperimentName(String),
    #[error("Malformed node list row '{0}': expected 'name,alias,type'")]
    MalformedNodeList(String),
    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),
    #[error("Must specify values that add to 100 in op_distribution, got '{0}'")]
    BadOpDistribution(String),
    #[error("'{0}' is not a numeric key bound")]
    BadKeyBound(String),
    #[error("Failed to parse param config: {0}")]
    BadParamConfig(#[from] serde_json::Error),
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to execute local command: {0}")]
    LocalCommandError(#[from] std::io::Error),
}

use thiserror::Error;

/// Top-level error type used across the entire workspace.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid target '{0}'")]
    InvalidTarget(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("target '{0}' is already being monitored")]
    DuplicateTarget(String),

    #[error("target '{0}' is not being monitored")]
    UnknownTarget(String),

    #[error("monitor has been shut down")]
    ShutDown,

    /// A single probe did not get a response.  Never escapes a sampler.
    #[error("probe error: {0}")]
    Probe(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = WatchError> = std::result::Result<T, E>;

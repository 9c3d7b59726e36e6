use std::time::Duration;

use thiserror::Error;

use crate::types::Strategy;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Provider failed: {0}")]
    Provider(String),

    #[error("{branch} branch exceeded its {}ms deadline", deadline.as_millis())]
    Timeout { branch: Strategy, deadline: Duration },

    #[error("Query optimization failed: {source}")]
    Optimization {
        #[source]
        source: Box<Error>,
    },

    #[error("Cache backend failed: {0}")]
    Cache(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wrap a failure from analyze/optimize/execute. Input errors and errors
    /// that are already wrapped pass through unchanged.
    pub fn optimization(cause: Error) -> Self {
        match cause {
            Error::Input(_) | Error::Optimization { .. } => cause,
            other => Error::Optimization { source: Box::new(other) },
        }
    }

    /// Embedding and vector-store failures.
    pub fn is_provider(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::Provider(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Short, stable label used by metric events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Input(_) => "input",
            Error::Embedding(_) | Error::Provider(_) => "provider",
            Error::Timeout { .. } => "timeout",
            Error::Optimization { .. } => "optimization",
            Error::Cache(_) => "cache",
            Error::InvalidConfig(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

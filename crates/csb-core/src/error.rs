//! Error model: configuration errors fail before any thread is spawned;
//! resource-acquisition errors are fatal once spawning has begun. Neither is
//! retried — the core either refuses to start or proceeds to completion.

use thiserror::Error;

/// Failures detected before the run phase, at parameter-validation time.
///
/// Each variant maps to a distinct nonzero process exit code in `csb-cli`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("operation weights sum to {actual}, expected exactly 1024")]
    WeightSumMismatch { actual: u32 },

    #[error("operation weight vector is empty")]
    EmptyWeights,

    #[error("number of threads must be at least 1")]
    ZeroThreads,

    #[error("could not parse network endpoint from {var}={value:?}")]
    BadEndpoint { var: &'static str, value: String },
}

/// Failures acquiring OS resources needed to enter the run phase.
///
/// If any worker thread fails to spawn, `Harness::run` stops spawning
/// immediately and returns this error rather than entering the run phase
/// partially initialized.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to spawn worker thread {thread_id}: {source}")]
    ThreadSpawn {
        thread_id: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error returned by the phase driver.
#[derive(Debug, Error)]
pub enum BmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl BmError {
    /// Distinct nonzero exit status per error kind, per §7 of the design.
    pub fn exit_code(&self) -> i32 {
        match self {
            BmError::Config(ConfigError::WeightSumMismatch { .. }) => 2,
            BmError::Config(ConfigError::EmptyWeights) => 3,
            BmError::Config(ConfigError::ZeroThreads) => 4,
            BmError::Config(ConfigError::BadEndpoint { .. }) => 5,
            BmError::Resource(ResourceError::ThreadSpawn { .. }) => 10,
        }
    }
}

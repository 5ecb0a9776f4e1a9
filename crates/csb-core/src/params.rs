//! Immutable-after-warmup configuration. Produced by an external parser
//! (`csb-cli`'s `clap`-derived flags plus the two environment-variable
//! pairs below); the core only validates and consumes it.

use std::net::{SocketAddr, ToSocketAddrs};

use crate::distribution::DISTRIBUTION_BOUND;
use crate::error::ConfigError;

/// Default port used by both endpoint pairs when `*_PORT` is unset.
pub const DEFAULT_ENDPOINT_PORT: u16 = 31334;

/// A network endpoint resolved from an environment-variable pair, made
/// available to the target (e.g. a target that drives the auxiliary TCP
/// driver in `csb-netdriver`). The core itself never dials or binds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetEndpoint {
    pub addr: SocketAddr,
}

impl NetEndpoint {
    /// Resolve `{addr_var}`/`{port_var}` from the process environment.
    /// Returns `Ok(None)` if `addr_var` is unset (the endpoint is optional);
    /// `Err` if it is set but does not parse.
    fn from_env(addr_var: &'static str, port_var: &'static str) -> Result<Option<Self>, ConfigError> {
        let Ok(addr_str) = std::env::var(addr_var) else {
            return Ok(None);
        };
        let port = match std::env::var(port_var) {
            Ok(p) => p.parse::<u16>().map_err(|_| ConfigError::BadEndpoint {
                var: port_var,
                value: p.clone(),
            })?,
            Err(_) => DEFAULT_ENDPOINT_PORT,
        };
        let host_port = format!("{addr_str}:{port}");
        let addr = host_port
            .to_socket_addrs()
            .ok()
            .and_then(|mut it| it.next())
            .ok_or_else(|| ConfigError::BadEndpoint {
                var: addr_var,
                value: addr_str.clone(),
            })?;
        Ok(Some(NetEndpoint { addr }))
    }
}

/// Typed configuration, immutable after warmup.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Worker thread count `T`, >= 1.
    pub num_threads: usize,
    /// Run-phase duration.
    pub duration_secs: u64,
    /// Passed verbatim to `Target::init`.
    pub initial_size: usize,
    /// Operation weight vector `W`; must sum to [`DISTRIBUTION_BOUND`].
    pub weights: Vec<u32>,
    /// Upper bound on inter-operation busy cycles.
    pub max_noise: u64,
    /// Whether noise is a fixed `max_noise` cycles or redrawn per iteration.
    pub random_noise: bool,
    /// Resolved from `BM_SYS_CONNECT_ADDR`/`BM_SYS_CONNECT_PORT`, if set.
    pub connect_endpoint: Option<NetEndpoint>,
    /// Resolved from `BM_SYS_BIND_ADDR`/`BM_SYS_BIND_PORT`, if set.
    pub bind_endpoint: Option<NetEndpoint>,
}

impl Parameters {
    /// Validate invariants that must hold before any thread is spawned.
    /// A weight sum mismatch or zero thread count is a fatal warmup-phase
    /// error per §7.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.weights.is_empty() {
            return Err(ConfigError::EmptyWeights);
        }
        let total: u64 = self.weights.iter().map(|&w| w as u64).sum();
        if total != DISTRIBUTION_BOUND as u64 {
            return Err(ConfigError::WeightSumMismatch { actual: total as u32 });
        }
        Ok(())
    }

    /// Resolve both optional network endpoints from the process environment.
    /// Called once, during warmup.
    pub fn resolve_endpoints(&mut self) -> Result<(), ConfigError> {
        self.connect_endpoint = NetEndpoint::from_env("BM_SYS_CONNECT_ADDR", "BM_SYS_CONNECT_PORT")?;
        self.bind_endpoint = NetEndpoint::from_env("BM_SYS_BIND_ADDR", "BM_SYS_BIND_PORT")?;
        Ok(())
    }

    pub fn op_count(&self) -> usize {
        self.weights.len()
    }
}

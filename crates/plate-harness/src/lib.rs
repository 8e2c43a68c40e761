//! Drivers around the plate builder: logging setup and the stress runner.
//!
//! - [`logging`] installs the `tracing` subscriber for binaries and tests
//! - [`stress`] builds one parameter set repeatedly and logs timings as TSV
//! - [`resources`] samples host RAM and this process's CPU and memory

pub mod logging;
pub mod resources;
pub mod stress;

pub use resources::{ResourceSample, ResourceSampler};
pub use stress::{average_parameters, run_stress, StressConfig, StressError, StressSummary};

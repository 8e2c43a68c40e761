//! Host and process resource sampling for stress rows.

use std::num::NonZeroUsize;

use sysinfo::{Pid, ProcessesToUpdate, System};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Resource usage after one build.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSample {
    /// Physical memory in use on the host.
    pub used_ram_gb: f64,
    /// CPU used by this process since the previous sample, as a share of
    /// all cores.
    pub cpu_percent: f64,
    /// Resident memory of this process.
    pub working_set_mb: f64,
}

/// Keeps one `System` across samples so process CPU usage is measured
/// between consecutive refreshes.
pub struct ResourceSampler {
    sys: System,
    pid: Option<Pid>,
    cores: f64,
}

impl ResourceSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "cannot resolve own pid, process metrics read as 0");
                None
            }
        };
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let mut sampler = Self {
            sys: System::new(),
            pid,
            cores: cores as f64,
        };
        // First refresh sets the CPU baseline.
        sampler.refresh();
        sampler
    }

    fn refresh(&mut self) {
        self.sys.refresh_memory();
        if let Some(pid) = self.pid {
            self.sys
                .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        }
    }

    pub fn sample(&mut self) -> ResourceSample {
        self.refresh();
        let process = self.pid.and_then(|pid| self.sys.process(pid));
        ResourceSample {
            used_ram_gb: self.sys.used_memory() as f64 / BYTES_PER_GB,
            cpu_percent: process.map_or(0.0, |p| f64::from(p.cpu_usage()) / self.cores),
            working_set_mb: process.map_or(0.0, |p| p.memory() as f64 / BYTES_PER_MB),
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

//! Process memory snapshots.

use serde::Serialize;
use sysinfo::{Pid, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Memory figures in MB, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    /// Resident set size of this process.
    pub rss_mb: f64,
    /// Virtual size of this process.
    pub virtual_mb: f64,
    pub system_used_mb: f64,
    pub system_total_mb: f64,
}

/// Source of memory snapshots.
pub trait MemoryProbe: Send + Sync {
    /// `None` when the platform does not expose process memory.
    fn snapshot(&self) -> Option<MemorySnapshot>;
}

/// Reads figures for the current process through `sysinfo`.
#[derive(Debug, Clone, Copy)]
pub struct SysinfoProbe {
    pid: Option<Pid>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn snapshot(&self) -> Option<MemorySnapshot> {
        let pid = self.pid?;
        let mut sys = System::new();
        if !sys.refresh_process(pid) {
            return None;
        }
        sys.refresh_memory();
        let process = sys.process(pid)?;

        Some(MemorySnapshot {
            rss_mb: to_mb(process.memory()),
            virtual_mb: to_mb(process.virtual_memory()),
            system_used_mb: to_mb(sys.used_memory()),
            system_total_mb: to_mb(sys.total_memory()),
        })
    }
}

/// Probe for platforms without introspection; snapshots are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProbe;

impl MemoryProbe for NoopProbe {
    fn snapshot(&self) -> Option<MemorySnapshot> {
        None
    }
}

pub fn to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MB)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

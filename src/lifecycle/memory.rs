//! Soft process memory ceiling.
//!
//! # Responsibilities
//! - Record the configured ceiling once per process
//! - Periodically sample resident memory and warn when above the ceiling
//!
//! # Design Decisions
//! - Soft cap: nothing is freed or refused, crossing the ceiling is only reported
//! - A negative limit disables the ceiling
//! - Resident size comes from `/proc/self/status`; elsewhere sampling is skipped

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::observability::metrics;

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);

static CEILING: OnceLock<MemoryCeiling> = OnceLock::new();

/// Soft cap on resident memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCeiling {
    limit_bytes: Option<u64>,
}

impl MemoryCeiling {
    /// Ceiling for a configured limit in bytes; negative means no ceiling.
    pub fn from_limit(limit: i64) -> Self {
        Self {
            limit_bytes: u64::try_from(limit).ok(),
        }
    }

    /// Configured ceiling, `None` when disabled.
    pub fn limit_bytes(&self) -> Option<u64> {
        self.limit_bytes
    }

    /// Bytes above the ceiling, if `resident` exceeds it.
    pub fn excess(&self, resident: u64) -> Option<u64> {
        self.limit_bytes
            .filter(|limit| resident > *limit)
            .map(|limit| resident - limit)
    }
}

/// Apply the ceiling process-wide. The first call wins; later calls with a
/// different value are ignored with a warning.
pub fn apply_memory_limit(limit: i64) -> MemoryCeiling {
    let requested = MemoryCeiling::from_limit(limit);
    let active = *CEILING.get_or_init(|| {
        tracing::info!(limit_bytes = ?requested.limit_bytes, "Memory ceiling applied");
        requested
    });

    if active != requested {
        tracing::warn!(
            active = ?active.limit_bytes,
            requested = ?requested.limit_bytes,
            "Memory ceiling already applied, keeping the first value"
        );
    }

    active
}

/// Ceiling applied to this process, if any.
pub fn current_ceiling() -> Option<MemoryCeiling> {
    CEILING.get().copied()
}

/// Current resident set size in bytes.
pub fn resident_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

/// Extract `VmRSS` (reported in kB) from a `/proc/<pid>/status` body.
fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") | None => value.checked_mul(1024),
        Some(_) => None,
    }
}

/// Sample resident memory every `interval` until `shutdown` fires.
///
/// Returns `None` when the ceiling is disabled or sampling is unavailable.
pub fn spawn_watch(
    ceiling: MemoryCeiling,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Option<JoinHandle<()>> {
    ceiling.limit_bytes()?;
    resident_bytes()?;

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(resident) = resident_bytes() else { continue };
                    metrics::record_resident_memory(resident);
                    if let Some(excess) = ceiling.excess(resident) {
                        tracing::warn!(
                            resident_bytes = resident,
                            limit_bytes = ?ceiling.limit_bytes(),
                            excess_bytes = excess,
                            "Resident memory above ceiling"
                        );
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    }))
}

use std::collections::HashSet;
use std::time::Instant;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, ThreadKind, UpdateKind, Users};

use super::cpu::CpuDutyCycle;
use super::platform::{self, IoStats};
use super::process::{ProcessRecord, strip_domain};
use super::sampler::{SampleError, SnapshotSource};
use super::snapshot::{FullSnapshot, MemorySnapshot};
use crate::config::SamplerConfig;
use crate::format::{BYTES_PER_MB, bytes_to_gb, bytes_to_mb, round_1, truncate_chars};

/// Gathers one [`FullSnapshot`] per call. Owned by the sampler thread.
pub struct Collector {
    sys: System,
    users: Users,
    total_memory: u64,
    cpu: CpuDutyCycle,
    disk_io_threshold_mb: f64,
    name_max_len: usize,
    user_max_len: usize,
}

impl Collector {
    pub fn new(config: &SamplerConfig) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        // Captured once so memory percentages stay consistent across cycles.
        let total_memory = sys.total_memory();
        Collector {
            sys,
            users: Users::new_with_refreshed_list(),
            total_memory,
            cpu: CpuDutyCycle::new(config.cpu_sample_every),
            disk_io_threshold_mb: config.disk_io_threshold_mb,
            name_max_len: config.name_max_len,
            user_max_len: config.user_max_len,
        }
    }

    pub fn collect(&mut self) -> Result<FullSnapshot, SampleError> {
        let sample_cycle = self.cpu.is_sample_cycle();
        let _span = tracing::debug_span!("collector.collect", sample_cycle).entered();

        if self.total_memory == 0 {
            self.cpu.advance();
            return Err(SampleError::MemoryUnavailable);
        }

        self.sys.refresh_memory();
        let memory = memory_snapshot(
            self.sys.total_memory(),
            self.sys.used_memory(),
            self.sys.available_memory(),
        );

        let mut refresh = ProcessRefreshKind::nothing()
            .with_memory()
            .with_user(UpdateKind::OnlyIfNotSet);
        if sample_cycle {
            refresh = refresh.with_cpu();
        }
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, refresh);

        let now = Instant::now();
        let mut records = Vec::with_capacity(self.sys.processes().len());
        let mut alive = HashSet::with_capacity(self.sys.processes().len());

        for (pid, process) in self.sys.processes() {
            // Userland threads are listed alongside processes on Linux.
            if matches!(process.thread_kind(), Some(ThreadKind::Userland)) {
                continue;
            }
            let pid = pid.as_u32();
            let rss_bytes = process.memory();
            let cpu_time_ms = if sample_cycle {
                process.accumulated_cpu_time()
            } else {
                0
            };
            let cpu_percent = self.cpu.observe(pid, cpu_time_ms, now);

            let user = process
                .user_id()
                .and_then(|uid| self.users.get_user_by_id(uid))
                .map(|user| user.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let memory_mb = bytes_to_mb(rss_bytes);
            let disk_io_mb = disk_io_mb(memory_mb, self.disk_io_threshold_mb, || {
                platform::process_io(pid)
            });

            alive.insert(pid);
            records.push(ProcessRecord {
                pid,
                name: truncate_chars(&process.name().to_string_lossy(), self.name_max_len),
                user: truncate_chars(strip_domain(&user), self.user_max_len),
                cpu_percent,
                memory_mb,
                memory_percent: memory_percent(rss_bytes, self.total_memory),
                disk_io_mb,
            });
        }

        self.cpu.finish_cycle(&alive);
        tracing::debug!(processes = records.len(), "collected snapshot");
        Ok(FullSnapshot::new(memory, records))
    }
}

impl SnapshotSource for Collector {
    fn collect(&mut self) -> Result<FullSnapshot, SampleError> {
        Collector::collect(self)
    }
}

pub fn memory_snapshot(total: u64, used: u64, available: u64) -> MemorySnapshot {
    let percent = if total == 0 {
        0.0
    } else {
        round_1(total.saturating_sub(available) as f64 / total as f64 * 100.0)
    };
    MemorySnapshot {
        total_gb: bytes_to_gb(total),
        used_gb: bytes_to_gb(used),
        available_gb: bytes_to_gb(available),
        percent,
    }
}

pub fn memory_percent(rss_bytes: u64, total_memory: u64) -> f64 {
    if total_memory == 0 {
        return 0.0;
    }
    round_1(rss_bytes as f64 / total_memory as f64 * 100.0)
}

/// Disk I/O in MB, only queried for processes above the memory threshold.
/// Missing counters (access denied, unsupported) count as no I/O.
pub fn disk_io_mb(
    memory_mb: f64,
    threshold_mb: f64,
    io: impl FnOnce() -> Option<IoStats>,
) -> f64 {
    if memory_mb <= threshold_mb {
        return 0.0;
    }
    io().map(|stats| round_1(stats.total_bytes() as f64 / BYTES_PER_MB))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn disk_io_skipped_at_or_below_threshold() {
        let queried = Cell::new(false);
        let io = || {
            queried.set(true);
            Some(IoStats {
                read_bytes: 10 << 20,
                write_bytes: 10 << 20,
            })
        };
        assert_eq!(disk_io_mb(50.0, 50.0, io), 0.0);
        assert!(!queried.get());
        assert_eq!(disk_io_mb(12.0, 50.0, || None), 0.0);
    }

    #[test]
    fn disk_io_measured_above_threshold() {
        let io = || {
            Some(IoStats {
                read_bytes: 3 << 20,
                write_bytes: 1 << 20,
            })
        };
        assert_eq!(disk_io_mb(50.1, 50.0, io), 4.0);
        assert_eq!(disk_io_mb(512.0, 50.0, || None), 0.0);
    }

    #[test]
    fn memory_snapshot_uses_available_for_percent() {
        let gib = 1_073_741_824u64;
        let mem = memory_snapshot(16 * gib, 6 * gib, 8 * gib);
        assert_eq!(mem.total_gb, 16.0);
        assert_eq!(mem.used_gb, 6.0);
        assert_eq!(mem.available_gb, 8.0);
        assert_eq!(mem.percent, 50.0);
    }

    #[test]
    fn memory_percent_matches_megabytes() {
        let total = 8 * 1_073_741_824u64;
        let rss = 1_073_741_824u64;
        assert_eq!(memory_percent(rss, total), 12.5);
        assert_eq!(bytes_to_mb(rss) * BYTES_PER_MB / total as f64 * 100.0, 12.5);
        assert_eq!(memory_percent(rss, 0), 0.0);
    }

    #[test]
    fn collect_live_system_is_sorted_and_bounded() {
        let config = SamplerConfig::default();
        let mut collector = Collector::new(&config);
        let snapshot = collector.collect().expect("live snapshot");

        assert!(!snapshot.is_empty());
        assert!(snapshot.memory.total_gb > 0.0);
        assert!(
            snapshot
                .processes
                .windows(2)
                .all(|w| w[0].memory_mb >= w[1].memory_mb)
        );
        for record in &snapshot.processes {
            assert!(record.name.chars().count() <= config.name_max_len);
            assert!(record.user.chars().count() <= config.user_max_len);
            assert!(!record.user.contains('\\'));
            // First cycle is the CPU warm-up.
            assert_eq!(record.cpu_percent, 0.0);
            if record.memory_mb <= config.disk_io_threshold_mb {
                assert_eq!(record.disk_io_mb, 0.0);
            }
        }
    }
}

use super::process::ProcessRecord;

/// System memory figures in gigabytes (two decimals) plus used percentage
/// (one decimal).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MemorySnapshot {
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
    pub percent: f64,
}

/// Memory statistics and every enumerable process, ordered by resident
/// memory descending. Never mutated after the sampler hands it over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FullSnapshot {
    pub memory: MemorySnapshot,
    pub processes: Vec<ProcessRecord>,
}

impl FullSnapshot {
    pub fn new(memory: MemorySnapshot, mut processes: Vec<ProcessRecord>) -> Self {
        processes.sort_by(|a, b| {
            b.memory_mb
                .partial_cmp(&a.memory_mb)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { memory, processes }
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::format::round_1;

#[derive(Clone, Copy, Debug)]
struct CpuCounter {
    cpu_time_ms: u64,
    at: Instant,
}

/// Rotating CPU measurement schedule.
///
/// Only every `sample_every`-th cycle measures CPU, as the delta of
/// accumulated CPU time since the previous measurement of the same pid.
/// All other cycles reuse the last measured value. A pid seen for the first
/// time on a sample cycle only records its counter and reports `0.0`.
#[derive(Debug)]
pub struct CpuDutyCycle {
    sample_every: u32,
    cycle: u32,
    counters: HashMap<u32, CpuCounter>,
    cached: HashMap<u32, f32>,
}

impl CpuDutyCycle {
    pub fn new(sample_every: u32) -> Self {
        Self {
            sample_every: sample_every.max(1),
            cycle: 0,
            counters: HashMap::new(),
            cached: HashMap::new(),
        }
    }

    pub fn is_sample_cycle(&self) -> bool {
        self.cycle == 0
    }

    /// CPU percent to report for `pid` this cycle.
    ///
    /// `cpu_time_ms` is only read on sample cycles; callers may pass `0`
    /// on the others.
    pub fn observe(&mut self, pid: u32, cpu_time_ms: u64, now: Instant) -> f32 {
        if !self.is_sample_cycle() {
            return self.cached.get(&pid).copied().unwrap_or(0.0);
        }

        let current = CpuCounter { cpu_time_ms, at: now };
        let percent = match self.counters.insert(pid, current) {
            Some(previous) => usage_between(previous, current),
            None => 0.0,
        };
        self.cached.insert(pid, percent);
        percent
    }

    /// Drop state for pids that were not seen this cycle and advance the
    /// rotation.
    pub fn finish_cycle(&mut self, alive: &HashSet<u32>) {
        self.counters.retain(|pid, _| alive.contains(pid));
        self.cached.retain(|pid, _| alive.contains(pid));
        self.advance();
    }

    /// Advance the rotation without pruning, for cycles that were abandoned.
    pub fn advance(&mut self) {
        self.cycle = (self.cycle + 1) % self.sample_every;
    }

    pub fn tracked(&self) -> usize {
        self.cached.len()
    }
}

fn usage_between(previous: CpuCounter, current: CpuCounter) -> f32 {
    let elapsed_ms = current.at.saturating_duration_since(previous.at).as_millis();
    if elapsed_ms == 0 {
        return 0.0;
    }
    // A smaller counter means the pid was reused by a new process.
    let busy_ms = current.cpu_time_ms.saturating_sub(previous.cpu_time_ms);
    round_1(busy_ms as f64 / elapsed_ms as f64 * 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn alive(pids: &[u32]) -> HashSet<u32> {
        pids.iter().copied().collect()
    }

    #[test]
    fn first_sample_cycle_reports_zero() {
        let mut duty = CpuDutyCycle::new(4);
        assert!(duty.is_sample_cycle());
        assert_eq!(duty.observe(7, 5_000, Instant::now()), 0.0);
    }

    #[test]
    fn non_sample_cycles_reuse_cached_value() {
        let t0 = Instant::now();
        let mut duty = CpuDutyCycle::new(2);

        duty.observe(7, 1_000, t0);
        duty.finish_cycle(&alive(&[7]));
        // off cycle
        assert_eq!(duty.observe(7, 0, t0 + Duration::from_secs(1)), 0.0);
        duty.finish_cycle(&alive(&[7]));

        // second sample cycle: 500ms busy over 2s
        let measured = duty.observe(7, 1_500, t0 + Duration::from_secs(2));
        assert_eq!(measured, 25.0);
        duty.finish_cycle(&alive(&[7]));

        // off cycle returns the measured value, not a fresh computation
        assert_eq!(duty.observe(7, 99_999, t0 + Duration::from_secs(3)), 25.0);
    }

    #[test]
    fn sample_cycle_measures_delta_after_warm_up() {
        let t0 = Instant::now();
        let mut duty = CpuDutyCycle::new(1);

        assert_eq!(duty.observe(1, 2_000, t0), 0.0);
        duty.finish_cycle(&alive(&[1]));
        let pct = duty.observe(1, 2_400, t0 + Duration::from_millis(800));
        assert_eq!(pct, 50.0);
    }

    #[test]
    fn pid_reuse_does_not_underflow() {
        let t0 = Instant::now();
        let mut duty = CpuDutyCycle::new(1);
        duty.observe(3, 10_000, t0);
        duty.finish_cycle(&alive(&[3]));
        assert_eq!(duty.observe(3, 10, t0 + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn vanished_pids_are_pruned() {
        let t0 = Instant::now();
        let mut duty = CpuDutyCycle::new(4);
        duty.observe(1, 0, t0);
        duty.observe(2, 0, t0);
        assert_eq!(duty.tracked(), 2);

        duty.finish_cycle(&alive(&[2]));
        assert_eq!(duty.tracked(), 1);
    }

    #[test]
    fn rotation_wraps_every_n_cycles() {
        let mut duty = CpuDutyCycle::new(4);
        let none = HashSet::new();
        let pattern: Vec<bool> = (0..8)
            .map(|_| {
                let sample = duty.is_sample_cycle();
                duty.finish_cycle(&none);
                sample
            })
            .collect();
        assert_eq!(
            pattern,
            vec![true, false, false, false, true, false, false, false]
        );
    }
}

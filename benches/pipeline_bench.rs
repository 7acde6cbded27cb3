use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveTime;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use taskwatch::pipeline::filter::{FilterCriteria, FilteredView, apply_filters};
use taskwatch::pipeline::render::{Renderer, TableModel};
use taskwatch::system::actions::{ActionError, ProcessControl};
use taskwatch::system::process::ProcessRecord;
use taskwatch::system::snapshot::{FullSnapshot, MemorySnapshot};

struct AllReadable;

impl ProcessControl for AllReadable {
    fn terminate(&mut self, pid: u32) -> Result<(), ActionError> {
        Err(ActionError::NotFound(pid))
    }

    fn executable_path(&mut self, pid: u32) -> Result<PathBuf, ActionError> {
        Ok(PathBuf::from(format!("/usr/lib/proc_{pid}/bin")))
    }

    fn path_exists(&self, _path: &Path) -> bool {
        true
    }

    fn directory_readable(&self, _dir: &Path) -> bool {
        true
    }

    fn reveal(&mut self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

fn make_snapshot(n: usize, seed: u32) -> FullSnapshot {
    let processes = (0..n)
        .map(|i| ProcessRecord {
            pid: i as u32 + 100,
            name: format!("proc_{i}"),
            user: if i % 7 == 0 { "root" } else { "alice" }.to_string(),
            cpu_percent: ((i as u32 + seed) % 100) as f64,
            memory_mb: ((n - i) as f64) * 1.5 + f64::from(seed % 3),
            memory_percent: ((n - i) as f64) / n as f64 * 12.0,
            disk_io_mb: 0.0,
        })
        .collect();
    FullSnapshot::new(
        MemorySnapshot {
            total_gb: 32.0,
            used_gb: 12.0,
            available_gb: 20.0,
            percent: 37.5,
        },
        processes,
    )
}

fn criteria() -> FilterCriteria {
    FilterCriteria {
        hide_system: true,
        hide_inaccessible: true,
        search: "proc_1".to_string(),
    }
}

fn bench_apply_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_filters_500_1000_2000");
    let criteria = criteria();

    for size in [500usize, 1000, 2000] {
        let snapshot = make_snapshot(size, 0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let view = apply_filters(black_box(snapshot), &criteria, &mut AllReadable);
                black_box(view);
            })
        });
    }

    group.finish();
}

fn bench_diff_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_render_500_1000_2000");
    let clock = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();

    for size in [500usize, 1000, 2000] {
        let unfiltered = FilterCriteria::default();
        let first: FilteredView = apply_filters(&make_snapshot(size, 0), &unfiltered, &mut AllReadable);
        let second: FilteredView = apply_filters(&make_snapshot(size, 1), &unfiltered, &mut AllReadable);

        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(first, second),
            |b, (first, second)| {
                b.iter(|| {
                    let mut renderer = Renderer::new(Duration::from_millis(80), 8, 40);
                    let mut table = TableModel::default();
                    let now = Instant::now();
                    renderer.render(black_box(first), &mut table, Some(40), now, clock);
                    let outcome = renderer.render(black_box(second), &mut table, Some(40), now, clock);
                    black_box(outcome);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_apply_filters, bench_diff_render);
criterion_main!(benches);

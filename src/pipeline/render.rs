use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use chrono::NaiveTime;

use super::filter::FilteredView;
use super::timer::Timer;
use crate::system::process::ProcessRecord;
use crate::system::snapshot::MemorySnapshot;

pub const COLUMN_COUNT: usize = 7;
pub const COLUMN_TITLES: [&str; COLUMN_COUNT] =
    ["PID", "User", "Name", "CPU %", "RAM (MB)", "RAM %", "Disk (MB)"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Strong,
    Weak,
    None,
}

pub fn highlight_for(memory_percent: f64) -> Highlight {
    if memory_percent > 10.0 {
        Highlight::Strong
    } else if memory_percent > 5.0 {
        Highlight::Weak
    } else {
        Highlight::None
    }
}

/// Display cells for one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedRow {
    pub pid: u32,
    pub cells: [String; COLUMN_COUNT],
    pub highlight: Highlight,
}

impl PaintedRow {
    pub fn from_record(record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            cells: [
                record.pid.to_string(),
                record.user.clone(),
                record.name.clone(),
                format!("{:.1}", record.cpu_percent),
                format!("{:.1}", record.memory_mb),
                format!("{:.1}", record.memory_percent),
                format!("{:.1}", record.disk_io_mb),
            ],
            highlight: highlight_for(record.memory_percent),
        }
    }
}

/// Painted table state: one slot per row, plus scroll, cursor and selection.
///
/// An empty slot is a row that exists but has not been painted yet. Every
/// paint, clear and rebuild is counted in `mutations`.
#[derive(Debug, Default)]
pub struct TableModel {
    rows: Vec<Option<PaintedRow>>,
    selected: HashSet<u32>,
    scroll_offset: usize,
    cursor: usize,
    mutations: usize,
}

impl TableModel {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&PaintedRow> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    pub fn is_painted(&self, index: usize) -> bool {
        self.row(index).is_some()
    }

    pub fn painted_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    fn rebuild(&mut self, len: usize) {
        self.rows.clear();
        self.rows.resize(len, None);
        self.mutations += 1;
    }

    fn paint_row(&mut self, index: usize, row: PaintedRow) {
        self.rows[index] = Some(row);
        self.mutations += 1;
    }

    fn clear_row(&mut self, index: usize) {
        if self.rows[index].take().is_some() {
            self.mutations += 1;
        }
    }

    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> &HashSet<u32> {
        &self.selected
    }

    pub fn is_selected(&self, pid: u32) -> bool {
        self.selected.contains(&pid)
    }

    pub fn toggle_selected(&mut self, pid: u32) {
        if !self.selected.remove(&pid) {
            self.selected.insert(pid);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    fn max_offset(&self, viewport: usize) -> usize {
        self.rows.len().saturating_sub(viewport.max(1))
    }

    /// Rows `[start, end)` currently inside the viewport.
    pub fn visible_range(&self, viewport: usize) -> (usize, usize) {
        let start = self.scroll_offset.min(self.rows.len());
        let end = start.saturating_add(viewport).min(self.rows.len());
        (start, end)
    }

    /// Returns `true` when the offset actually changed.
    pub fn scroll_to(&mut self, offset: usize, viewport: usize) -> bool {
        let offset = offset.min(self.max_offset(viewport));
        let changed = offset != self.scroll_offset;
        self.scroll_offset = offset;
        if changed {
            let (start, end) = self.visible_range(viewport);
            if end > start {
                self.cursor = self.cursor.clamp(start, end - 1);
            }
        }
        changed
    }

    pub fn scroll_by(&mut self, delta: isize, viewport: usize) -> bool {
        self.scroll_to(self.scroll_offset.saturating_add_signed(delta), viewport)
    }

    /// Move the cursor, scrolling just enough to keep it visible. Returns
    /// `true` when the scroll offset changed.
    pub fn move_cursor(&mut self, delta: isize, viewport: usize) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        self.cursor = self
            .cursor
            .saturating_add_signed(delta)
            .min(self.rows.len() - 1);
        let viewport = viewport.max(1);
        let offset = if self.cursor < self.scroll_offset {
            self.cursor
        } else if self.cursor >= self.scroll_offset + viewport {
            self.cursor + 1 - viewport
        } else {
            return false;
        };
        let changed = offset != self.scroll_offset;
        self.scroll_offset = offset;
        changed
    }
}

/// The rows and memory summary most recently handed to the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedRowSet {
    pub memory: MemorySnapshot,
    pub rows: Vec<ProcessRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    pub full_rebuild: bool,
    pub painted: usize,
    pub queued: usize,
}

/// Diffs filtered views into a [`TableModel`] and fills off-screen rows in
/// small timed batches.
#[derive(Debug)]
pub struct Renderer {
    rendered: Option<RenderedRowSet>,
    pending_fill: VecDeque<usize>,
    fill_timer: Timer,
    fill_batch: usize,
    fill_paused: bool,
    fallback_visible_rows: usize,
    status: String,
}

impl Renderer {
    pub fn new(fill_interval: Duration, fill_batch: usize, fallback_visible_rows: usize) -> Self {
        Self {
            rendered: None,
            pending_fill: VecDeque::new(),
            fill_timer: Timer::new(fill_interval),
            fill_batch: fill_batch.max(1),
            fill_paused: false,
            fallback_visible_rows: fallback_visible_rows.max(1),
            status: String::new(),
        }
    }

    pub fn rendered(&self) -> Option<&RenderedRowSet> {
        self.rendered.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn pending_fill(&self) -> usize {
        self.pending_fill.len()
    }

    pub fn fill_active(&self) -> bool {
        self.fill_timer.is_active()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.fill_timer.deadline()
    }

    /// Bring `table` in line with `view`.
    ///
    /// A row count change rebuilds the table. Otherwise only rows whose
    /// record changed are touched: visible ones are painted now, off-screen
    /// ones are cleared and queued for the filler. Scroll offset and
    /// selected pids survive the update; a selected pid that drops out of
    /// the view is selected again when it reappears.
    pub fn render(
        &mut self,
        view: &FilteredView,
        table: &mut TableModel,
        viewport: Option<usize>,
        now: Instant,
        clock: NaiveTime,
    ) -> RenderOutcome {
        let viewport = viewport.filter(|v| *v > 0).unwrap_or(self.fallback_visible_rows);
        let scroll = table.scroll_offset;
        let cursor_pid = self
            .rendered
            .as_ref()
            .and_then(|r| r.rows.get(table.cursor))
            .map(|r| r.pid);

        let previous = self.rendered.take().unwrap_or_default();
        let full_rebuild = previous.rows.len() != view.rows.len() || table.len() != view.rows.len();
        if full_rebuild {
            table.rebuild(view.rows.len());
        }

        // Restore before computing the visible range so the painted rows are
        // the ones the user will see.
        table.scroll_offset = scroll.min(table.max_offset(viewport));
        let (start, end) = table.visible_range(viewport);

        let mut outcome = RenderOutcome {
            full_rebuild,
            ..RenderOutcome::default()
        };
        self.pending_fill.clear();
        for (index, record) in view.rows.iter().enumerate() {
            let changed = full_rebuild || previous.rows[index] != *record;
            if !changed && table.is_painted(index) {
                continue;
            }
            if (start..end).contains(&index) {
                table.paint_row(index, PaintedRow::from_record(record));
                outcome.painted += 1;
            } else {
                if changed {
                    table.clear_row(index);
                }
                self.pending_fill.push_back(index);
            }
        }
        outcome.queued = self.pending_fill.len();

        table.cursor = cursor_pid
            .and_then(|pid| view.rows.iter().position(|r| r.pid == pid))
            .unwrap_or(table.cursor)
            .min(view.rows.len().saturating_sub(1));

        self.rendered = Some(RenderedRowSet {
            memory: view.memory,
            rows: view.rows.clone(),
        });
        self.status = status_line(clock, view.rows.len(), view.total, view.filtered);

        if self.pending_fill.is_empty() {
            self.fill_timer.stop();
        } else if !self.fill_paused && !self.fill_timer.is_active() {
            self.fill_timer.start(now);
        }

        tracing::debug!(
            rows = view.rows.len(),
            full_rebuild,
            painted = outcome.painted,
            queued = outcome.queued,
            "rendered view"
        );
        outcome
    }

    /// Paint up to one batch of queued rows, preferring rows currently in
    /// view. Re-arms itself while work remains.
    pub fn fill_step(&mut self, table: &mut TableModel, viewport: Option<usize>, now: Instant) -> usize {
        let Some(rendered) = self.rendered.as_ref() else {
            self.pending_fill.clear();
            return 0;
        };
        let viewport = viewport.filter(|v| *v > 0).unwrap_or(self.fallback_visible_rows);
        let (start, end) = table.visible_range(viewport);

        let mut batch: Vec<usize> = Vec::with_capacity(self.fill_batch);
        self.pending_fill.retain(|index| {
            if batch.len() < self.fill_batch && (start..end).contains(index) {
                batch.push(*index);
                false
            } else {
                true
            }
        });
        while batch.len() < self.fill_batch {
            match self.pending_fill.pop_front() {
                Some(index) => batch.push(index),
                None => break,
            }
        }

        let mut painted = 0;
        for index in batch {
            if index >= table.len() || table.is_painted(index) {
                continue;
            }
            if let Some(record) = rendered.rows.get(index) {
                table.paint_row(index, PaintedRow::from_record(record));
                painted += 1;
            }
        }

        if self.pending_fill.is_empty() {
            self.fill_timer.stop();
        } else {
            self.fill_timer.start(now);
        }
        painted
    }

    /// Run the filler if its tick is due. Returns `true` when rows were painted.
    pub fn poll(&mut self, table: &mut TableModel, viewport: Option<usize>, now: Instant) -> bool {
        if self.fill_paused || !self.fill_timer.fire(now) {
            return false;
        }
        self.fill_step(table, viewport, now) > 0
    }

    pub fn pause_fill(&mut self) {
        self.fill_paused = true;
        self.fill_timer.stop();
    }

    pub fn resume_fill(&mut self, now: Instant) {
        self.fill_paused = false;
        if !self.pending_fill.is_empty() {
            self.fill_timer.start_in(now, Duration::ZERO);
        }
    }
}

pub fn status_line(clock: NaiveTime, shown: usize, total: usize, filtered: bool) -> String {
    let time = clock.format("%H:%M:%S");
    if filtered {
        format!("Ready - Last updated: {time} | Showing: {shown} / Total Processes: {total}")
    } else {
        format!("Ready - Last updated: {time} | Total Processes: {total}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, memory_percent: f64) -> ProcessRecord {
        ProcessRecord {
            pid,
            name: format!("proc{pid}"),
            user: "alice".to_string(),
            cpu_percent: 1.0,
            memory_mb: memory_percent * 100.0,
            memory_percent,
            disk_io_mb: 0.0,
        }
    }

    fn view(rows: Vec<ProcessRecord>) -> FilteredView {
        let total = rows.len();
        FilteredView {
            memory: MemorySnapshot::default(),
            rows,
            total,
            filtered: false,
        }
    }

    fn many(n: u32) -> Vec<ProcessRecord> {
        (1..=n).map(|pid| record(pid, 0.5)).collect()
    }

    fn clock() -> NaiveTime {
        NaiveTime::from_hms_opt(14, 3, 9).unwrap()
    }

    fn renderer() -> Renderer {
        Renderer::new(Duration::from_millis(80), 8, 20)
    }

    #[test]
    fn highlight_classes_follow_memory_percent() {
        let rows = [record(1, 12.0), record(2, 6.0), record(3, 2.0)];
        let classes: Vec<Highlight> = rows
            .iter()
            .map(|r| PaintedRow::from_record(r).highlight)
            .collect();
        insta::assert_debug_snapshot!(classes, @r"
        [
            Strong,
            Weak,
            None,
        ]
        ");
        assert_eq!(highlight_for(10.0), Highlight::Weak);
        assert_eq!(highlight_for(5.0), Highlight::None);
    }

    #[test]
    fn unchanged_view_causes_no_mutations() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        let v = view(many(5));

        r.render(&v, &mut table, Some(10), t0, clock());
        assert!(table.mutations() > 0);
        table.reset_mutations();

        let outcome = r.render(&v, &mut table, Some(10), t0, clock());
        assert_eq!(table.mutations(), 0);
        assert_eq!(outcome.painted, 0);
        assert!(!outcome.full_rebuild);
    }

    #[test]
    fn only_changed_rows_are_repainted() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        let mut rows = many(5);
        r.render(&view(rows.clone()), &mut table, Some(10), t0, clock());
        table.reset_mutations();

        rows[3].cpu_percent = 42.0;
        let outcome = r.render(&view(rows), &mut table, Some(10), t0, clock());
        assert_eq!(outcome.painted, 1);
        assert_eq!(table.mutations(), 1);
        assert_eq!(table.row(3).unwrap().cells[3], "42.0");
    }

    #[test]
    fn row_count_change_rebuilds() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        r.render(&view(many(5)), &mut table, Some(10), t0, clock());
        let outcome = r.render(&view(many(6)), &mut table, Some(10), t0, clock());
        assert!(outcome.full_rebuild);
        assert_eq!(table.len(), 6);
        assert_eq!(table.painted_count(), 6);
    }

    #[test]
    fn off_screen_rows_are_filled_in_batches() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();

        let outcome = r.render(&view(many(30)), &mut table, Some(10), t0, clock());
        assert_eq!(outcome.painted, 10);
        assert_eq!(outcome.queued, 20);
        assert!(r.fill_active());
        assert!(!table.is_painted(10));

        assert!(!r.poll(&mut table, Some(10), t0 + Duration::from_millis(79)));
        assert!(r.poll(&mut table, Some(10), t0 + Duration::from_millis(80)));
        assert_eq!(table.painted_count(), 18);
        assert_eq!(r.pending_fill(), 12);

        let mut now = t0 + Duration::from_millis(80);
        while r.fill_active() {
            now += Duration::from_millis(80);
            r.poll(&mut table, Some(10), now);
        }
        assert_eq!(table.painted_count(), 30);
        assert_eq!(r.pending_fill(), 0);
    }

    #[test]
    fn filler_prefers_rows_scrolled_into_view() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        r.render(&view(many(40)), &mut table, Some(5), t0, clock());

        table.scroll_to(30, 5);
        r.fill_step(&mut table, Some(5), t0);
        assert!((30..35).all(|i| table.is_painted(i)));
    }

    #[test]
    fn changed_off_screen_row_is_cleared_and_queued() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        let mut rows = many(12);
        r.render(&view(rows.clone()), &mut table, Some(4), t0, clock());
        while r.fill_active() {
            r.fill_step(&mut table, Some(4), t0);
        }

        rows[10].memory_mb = 999.0;
        let outcome = r.render(&view(rows), &mut table, Some(4), t0, clock());
        assert_eq!(outcome.painted, 0);
        assert_eq!(outcome.queued, 1);
        assert!(!table.is_painted(10));
        r.fill_step(&mut table, Some(4), t0);
        assert_eq!(table.row(10).unwrap().cells[4], "999.0");
    }

    #[test]
    fn scroll_and_selection_survive_rebuild() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        r.render(&view(many(50)), &mut table, Some(10), t0, clock());

        table.scroll_to(15, 10);
        table.toggle_selected(20);
        table.toggle_selected(49);

        let mut rows = many(48);
        rows.insert(0, record(100, 0.5));
        let outcome = r.render(&view(rows), &mut table, Some(10), t0, clock());

        assert!(outcome.full_rebuild);
        assert_eq!(table.scroll_offset(), 15);
        assert!(table.is_selected(20));
        // pid 49 is no longer shown but stays selected
        assert!(table.is_selected(49));
        assert!((15..25).all(|i| table.is_painted(i)));
    }

    #[test]
    fn paused_filler_does_not_run() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        r.render(&view(many(30)), &mut table, Some(10), t0, clock());

        r.pause_fill();
        assert!(!r.poll(&mut table, Some(10), t0 + Duration::from_secs(1)));
        r.resume_fill(t0 + Duration::from_secs(1));
        assert!(r.poll(&mut table, Some(10), t0 + Duration::from_secs(1)));
    }

    #[test]
    fn cursor_moves_keep_it_visible() {
        let t0 = Instant::now();
        let mut r = renderer();
        let mut table = TableModel::default();
        r.render(&view(many(30)), &mut table, Some(10), t0, clock());

        assert!(!table.move_cursor(5, 10));
        assert!(table.move_cursor(7, 10));
        assert_eq!(table.cursor(), 12);
        assert_eq!(table.scroll_offset(), 3);
        assert!(table.move_cursor(-100, 10));
        assert_eq!((table.cursor(), table.scroll_offset()), (0, 0));
        assert!(!table.scroll_by(-1, 10));
    }

    #[test]
    fn status_line_mentions_shown_count_only_when_filtered() {
        assert_eq!(
            status_line(clock(), 3, 10, true),
            "Ready - Last updated: 14:03:09 | Showing: 3 / Total Processes: 10"
        );
        assert_eq!(
            status_line(clock(), 10, 10, false),
            "Ready - Last updated: 14:03:09 | Total Processes: 10"
        );
    }
}

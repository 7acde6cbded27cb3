use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::filter::FilteredView;
use super::render::RenderedRowSet;
use super::timer::{Timer, earliest};
use crate::config::{PipelineConfig, SignificanceConfig};
use crate::system::process::ProcessRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerEvent {
    /// The search debounce ran out; re-filter with the current search text.
    ApplySearch,
    /// Render the latest filtered view now.
    Render,
}

/// Collapses bursts of render requests into one render per quiet period.
///
/// Every request re-arms a short render timer. Search edits go through a
/// longer debounce first. While scrolling, a due render re-arms itself with a
/// growing delay instead of firing; while the window moves, nothing fires.
#[derive(Debug)]
pub struct Coalescer {
    render_timer: Timer,
    search_debounce: Timer,
    scroll_retry: Duration,
    scroll_retry_max: Duration,
    backoff: Option<Duration>,
    resume_delay: Duration,
    pending: bool,
    paused: bool,
}

impl Coalescer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            render_timer: Timer::new(Duration::from_millis(config.render_delay_ms)),
            search_debounce: Timer::new(Duration::from_millis(config.search_debounce_ms)),
            scroll_retry: Duration::from_millis(config.scroll_retry_ms),
            scroll_retry_max: Duration::from_millis(config.scroll_retry_max_ms.max(config.scroll_retry_ms)),
            backoff: None,
            resume_delay: Duration::from_millis(config.resume_delay_ms),
            pending: false,
            paused: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// A new filtered view is available. Cancels any scheduled render and
    /// schedules a fresh one after the coalescing delay.
    pub fn request_render(&mut self, now: Instant) {
        self.pending = true;
        self.backoff = None;
        if !self.paused {
            self.render_timer.start(now);
        }
    }

    /// Skip the coalescing delay and render on the next poll.
    pub fn request_immediate(&mut self, now: Instant) {
        self.pending = true;
        self.backoff = None;
        if !self.paused {
            self.render_timer.start_in(now, Duration::ZERO);
        }
    }

    pub fn search_changed(&mut self, now: Instant) {
        self.search_debounce.start(now);
    }

    /// Window move started: hold every scheduled render.
    pub fn pause(&mut self) {
        self.paused = true;
        self.render_timer.stop();
    }

    /// Window move ended: flush held work without delay.
    pub fn resume(&mut self, now: Instant) {
        self.paused = false;
        if self.pending {
            self.render_timer.start_in(now, Duration::ZERO);
        }
    }

    /// Scrolling stopped: a deferred render fires almost immediately.
    pub fn scroll_stopped(&mut self, now: Instant) {
        self.backoff = None;
        if self.pending && !self.paused {
            self.render_timer.start_in(now, self.resume_delay);
        }
    }

    pub fn poll(&mut self, now: Instant, scrolling: bool) -> Vec<CoalescerEvent> {
        let mut events = Vec::new();
        if self.search_debounce.fire(now) {
            events.push(CoalescerEvent::ApplySearch);
        }
        if self.paused || !self.render_timer.fire(now) {
            return events;
        }
        if scrolling {
            let delay = match self.backoff {
                None => self.scroll_retry,
                Some(previous) => (previous * 2).min(self.scroll_retry_max),
            };
            self.backoff = Some(delay);
            self.render_timer.start_in(now, delay);
            tracing::trace!(delay_ms = delay.as_millis() as u64, "render deferred while scrolling");
            return events;
        }
        self.pending = false;
        self.backoff = None;
        events.push(CoalescerEvent::Render);
        events
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        let render = if self.paused {
            None
        } else {
            self.render_timer.deadline()
        };
        earliest([render, self.search_debounce.deadline()])
    }
}

/// Whether `view` differs enough from what is on screen to skip coalescing.
///
/// Nothing rendered yet is never significant; the normal delay covers it.
pub fn is_significant_change(
    rendered: Option<&RenderedRowSet>,
    view: &FilteredView,
    thresholds: &SignificanceConfig,
) -> bool {
    let Some(rendered) = rendered else {
        return false;
    };
    if (view.memory.percent - rendered.memory.percent).abs() >= thresholds.memory_percent_delta {
        return true;
    }
    let top = |rows: &[ProcessRecord]| -> HashSet<u32> {
        rows.iter().take(thresholds.top_n).map(|r| r.pid).collect()
    };
    let new_top = top(&view.rows);
    let old_top = top(&rendered.rows);
    if !new_top.is_empty() && !old_top.is_empty() && new_top != old_top {
        return true;
    }
    view.rows.len().abs_diff(rendered.rows.len()) > thresholds.process_count_delta
}

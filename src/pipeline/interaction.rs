use std::time::{Duration, Instant};

use super::timer::{Timer, earliest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    ScrollStopped,
    MoveStopped,
}

/// Tracks whether the user is scrolling the table or moving the window.
///
/// Each signal re-arms an inactivity timer; the matching `*Stopped` event is
/// reported by [`InteractionTracker::poll`] once that timer runs out.
#[derive(Debug)]
pub struct InteractionTracker {
    scroll_idle: Timer,
    move_idle: Timer,
    scrolling: bool,
    moving: bool,
}

impl InteractionTracker {
    pub fn new(scroll_idle: Duration, move_idle: Duration) -> Self {
        Self {
            scroll_idle: Timer::new(scroll_idle),
            move_idle: Timer::new(move_idle),
            scrolling: false,
            moving: false,
        }
    }

    pub fn on_scroll(&mut self, now: Instant) {
        self.scrolling = true;
        self.scroll_idle.start(now);
    }

    /// Returns `true` when this signal starts a new move.
    pub fn on_window_moved(&mut self, now: Instant) -> bool {
        let started = !self.moving;
        self.moving = true;
        self.move_idle.start(now);
        if started {
            tracing::debug!("window move started, painting suspended");
        }
        started
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    pub fn paint_enabled(&self) -> bool {
        !self.moving
    }

    pub fn poll(&mut self, now: Instant) -> Vec<InteractionEvent> {
        let mut events = Vec::new();
        if self.scroll_idle.fire(now) {
            self.scrolling = false;
            events.push(InteractionEvent::ScrollStopped);
        }
        if self.move_idle.fire(now) {
            self.moving = false;
            tracing::debug!("window move stopped, painting resumed");
            events.push(InteractionEvent::MoveStopped);
        }
        events
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.scroll_idle.deadline(), self.move_idle.deadline()])
    }
}

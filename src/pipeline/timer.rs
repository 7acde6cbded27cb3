use std::time::{Duration, Instant};

/// Single-shot, re-armable deadline driven by the foreground event loop.
///
/// Starting an active timer replaces its deadline, which is how a pending
/// fire gets cancelled and rescheduled.
#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    /// Arm with the default interval.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Arm with a one-off delay.
    pub fn start_in(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and return `true` when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of several optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_interval() {
        let t0 = Instant::now();
        let mut timer = Timer::new(Duration::from_millis(20));
        timer.start(t0);

        assert!(!timer.fire(t0 + Duration::from_millis(19)));
        assert!(timer.fire(t0 + Duration::from_millis(20)));
        assert!(!timer.is_active());
        assert!(!timer.fire(t0 + Duration::from_millis(40)));
    }

    #[test]
    fn restart_pushes_deadline_back() {
        let t0 = Instant::now();
        let mut timer = Timer::new(Duration::from_millis(20));
        timer.start(t0);
        timer.start(t0 + Duration::from_millis(15));

        assert!(!timer.fire(t0 + Duration::from_millis(25)));
        assert!(timer.fire(t0 + Duration::from_millis(35)));
    }

    #[test]
    fn stop_cancels() {
        let t0 = Instant::now();
        let mut timer = Timer::new(Duration::from_millis(5));
        timer.start_in(t0, Duration::from_millis(1));
        timer.stop();
        assert!(!timer.fire(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn earliest_ignores_inactive() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(50);
        assert_eq!(earliest([None, Some(later), Some(t0)]), Some(t0));
        assert_eq!(earliest([None, None]), None);
    }
}

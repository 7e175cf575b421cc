use std::time::{Duration, Instant};

/// A named one-shot timer driven by the caller's clock.
///
/// Scheduling an already pending timer pushes its deadline back, which is
/// all a debounce needs: a burst of triggers fires once, `delay` after the
/// last one.
#[derive(Debug, Clone)]
pub struct Timer {
    name: &'static str,
    delay: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            deadline: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                log::trace!("Timer {} fired", self.name);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(400);

    #[test]
    fn test_idle_timer_never_fires() {
        let mut timer = Timer::new("autosave", DELAY);
        assert!(!timer.is_pending());
        assert!(!timer.fire(Instant::now() + DELAY * 10));
    }

    #[test]
    fn test_fires_once_after_delay() {
        let start = Instant::now();
        let mut timer = Timer::new("autosave", DELAY);
        timer.schedule(start);

        assert!(!timer.fire(start + DELAY / 2));
        assert!(timer.fire(start + DELAY));
        assert!(!timer.fire(start + DELAY * 2));
    }

    #[test]
    fn test_reschedule_pushes_deadline_back() {
        let start = Instant::now();
        let mut timer = Timer::new("autosave", DELAY);
        timer.schedule(start);
        timer.schedule(start + Duration::from_millis(300));

        assert!(!timer.fire(start + DELAY));
        assert!(timer.fire(start + Duration::from_millis(700)));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut timer = Timer::new("toast", DELAY);
        timer.schedule(start);
        timer.cancel();
        assert!(timer.deadline().is_none());
        assert!(!timer.fire(start + DELAY));
    }
}

use std::time::{Duration, Instant};

/// Fixed-period software timer serviced by polling once per tick.
///
/// Not preemptive: a timer that is polled late fires once and re-arms from
/// the poll time, it never catches up with a burst.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next: Instant,
}

impl IntervalTimer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next: now + period,
        }
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.period;
        true
    }
}

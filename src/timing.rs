//! Non-blocking, wraparound-safe cycle scheduling
//!
//! The node runs off a free-running millisecond tick counter that wraps at
//! `u32::MAX`. Everything here takes the current tick as an argument instead
//! of reading a clock, so the whole module is testable with injected ticks.

/// Elapsed milliseconds between two tick values, tolerating wraparound.
///
/// `now >= last` is the plain difference; otherwise the counter wrapped and
/// the result is `(u32::MAX - last) + now + 1`, which is exactly modular
/// subtraction over the counter width.
pub fn elapsed_ms(last: u32, now: u32) -> u32 {
    now.wrapping_sub(last)
}

/// One non-blocking interval timer.
///
/// State machine per the scheduler design: Idle (waiting) until the interval
/// elapses, then the caller observes expiry and resets `last = now`. A timer
/// that has never fired (`last` is `None`) is treated as immediately
/// expired, which guarantees one transmission right after boot instead of
/// waiting a full interval blind. Keeping "never fired" out of band means
/// every tick value, zero included, is a valid reset point with exact
/// expiry.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    interval_ms: u32,
    last: Option<u32>,
}

impl IntervalTimer {
    /// Create a timer that has never fired (expires on the first poll).
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last: None,
        }
    }

    /// True when the interval has elapsed (or the timer has never fired).
    pub fn expired(&self, now: u32) -> bool {
        match self.last {
            None => true,
            Some(last) => elapsed_ms(last, now) >= self.interval_ms,
        }
    }

    /// Mark the timer as having fired at `now`.
    pub fn reset(&mut self, now: u32) {
        self.last = Some(now);
    }

    /// Milliseconds until the next expiry, saturating at zero.
    pub fn remaining_ms(&self, now: u32) -> u32 {
        match self.last {
            None => 0,
            Some(last) => self.interval_ms.saturating_sub(elapsed_ms(last, now)),
        }
    }
}

/// Outcome of one scheduler poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Nothing due this iteration
    Idle,
    /// Run a sensor-read/transmit cycle now
    Transmit,
    /// Log node status; `next_transmit_ms` is the time until the next cycle
    StatusLog { next_transmit_ms: u32 },
}

/// Two independent timers sharing the wraparound-safe elapsed-time rule.
///
/// The transmission timer drives sensor-read/transmit cycles; the status
/// timer drives periodic log lines. A fired transmission resets both, so
/// status lines report time-since-last-transmission instead of drifting on
/// their own cadence. Intervals are fixed at construction; transmit
/// success or failure never reschedules anything.
#[derive(Debug)]
pub struct Scheduler {
    transmission: IntervalTimer,
    status_log: IntervalTimer,
}

impl Scheduler {
    /// Build from intervals already divided by the clock scale factor.
    pub fn new(transmission_interval_ms: u32, status_log_interval_ms: u32) -> Self {
        Self {
            transmission: IntervalTimer::new(transmission_interval_ms),
            status_log: IntervalTimer::new(status_log_interval_ms),
        }
    }

    /// Check both timers against `now`. Never blocks.
    ///
    /// Transmission takes priority; a poll reports at most one event.
    pub fn poll(&mut self, now: u32) -> SchedulerEvent {
        if self.transmission.expired(now) {
            self.transmission.reset(now);
            self.status_log.reset(now);
            return SchedulerEvent::Transmit;
        }

        if self.status_log.expired(now) {
            self.status_log.reset(now);
            return SchedulerEvent::StatusLog {
                next_transmit_ms: self.transmission.remaining_ms(now),
            };
        }

        SchedulerEvent::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_simple() {
        assert_eq!(elapsed_ms(1_000, 4_500), 3_500);
        assert_eq!(elapsed_ms(42, 42), 0);
    }

    #[test]
    fn test_elapsed_across_wraparound() {
        // Counter at u32::MAX - 99, then wraps to 400: true delta is 500.
        let last = u32::MAX - 99;
        let now = 400;
        assert_eq!(elapsed_ms(last, now), 500);

        // Wrap landing exactly on zero.
        assert_eq!(elapsed_ms(u32::MAX, 0), 1);
    }

    #[test]
    fn test_elapsed_matches_true_delta_through_wrap() {
        // Walk a simulated counter across the wrap point and compare
        // against independently tracked wall-clock time.
        let mut tick: u32 = u32::MAX - 10_000;
        let start = tick;
        let mut wall: u64 = 0;

        for _ in 0..40 {
            tick = tick.wrapping_add(700);
            wall += 700;
            assert_eq!(elapsed_ms(start, tick) as u64, wall);
        }
    }

    #[test]
    fn test_fresh_timer_fires_immediately() {
        let timer = IntervalTimer::new(60_000);
        assert!(timer.expired(5));
        assert_eq!(timer.remaining_ms(5), 0);
    }

    #[test]
    fn test_timer_expiry_and_reset() {
        let mut timer = IntervalTimer::new(1_000);
        timer.reset(100);

        assert!(!timer.expired(1_099));
        assert_eq!(timer.remaining_ms(1_099), 1);
        assert!(timer.expired(1_100));
        assert_eq!(timer.remaining_ms(1_100), 0);

        // Already past the interval: remaining saturates at zero.
        assert_eq!(timer.remaining_ms(5_000), 0);
    }

    #[test]
    fn test_reset_at_tick_zero_expires_exactly_on_interval() {
        let mut timer = IntervalTimer::new(1_000);
        timer.reset(0);

        // A tick-0 reset must not re-arm as "never fired"...
        assert!(!timer.expired(500));
        assert_eq!(timer.remaining_ms(500), 500);
        // ...and must not skew expiry either: due at exactly one interval.
        assert!(!timer.expired(999));
        assert!(timer.expired(1_000));
    }

    #[test]
    fn test_timer_across_wraparound() {
        let mut timer = IntervalTimer::new(1_000);
        timer.reset(u32::MAX - 200);

        assert!(!timer.expired(u32::MAX)); // 200 ms in
        assert!(!timer.expired(700));      // 901 ms in
        assert!(timer.expired(799));       // 1000 ms in
    }

    #[test]
    fn test_first_poll_transmits_immediately() {
        let mut scheduler = Scheduler::new(60_000, 10_000);
        assert_eq!(scheduler.poll(3), SchedulerEvent::Transmit);
        // And not again until a full interval later.
        assert_eq!(scheduler.poll(4), SchedulerEvent::Idle);
    }

    #[test]
    fn test_transmission_resets_status_cadence() {
        let mut scheduler = Scheduler::new(60_000, 10_000);
        assert_eq!(scheduler.poll(0), SchedulerEvent::Transmit);

        // Status timer was reset alongside the transmission, so it fires a
        // full status interval after the cycle, not before.
        assert_eq!(scheduler.poll(9_999), SchedulerEvent::Idle);
        assert_eq!(
            scheduler.poll(10_000),
            SchedulerEvent::StatusLog {
                next_transmit_ms: 50_000
            }
        );
    }

    #[test]
    fn test_status_log_remaining_saturates() {
        let mut scheduler = Scheduler::new(60_000, 10_000);
        scheduler.poll(0); // initial transmit

        // Skip straight past both deadlines; transmission wins the poll.
        assert_eq!(scheduler.poll(70_000), SchedulerEvent::Transmit);

        // Status alone expired, transmission still pending.
        match scheduler.poll(80_001) {
            SchedulerEvent::StatusLog { next_transmit_ms } => {
                assert_eq!(next_transmit_ms, 49_999);
            }
            other => panic!("expected StatusLog, got {:?}", other),
        }
    }

    #[test]
    fn test_scheduler_cycle_across_wraparound() {
        let mut scheduler = Scheduler::new(1_000, 300);
        let start = u32::MAX - 400;

        assert_eq!(scheduler.poll(start), SchedulerEvent::Transmit);
        // 300 ms later (still before the wrap) the status timer fires.
        assert!(matches!(
            scheduler.poll(start.wrapping_add(300)),
            SchedulerEvent::StatusLog { .. }
        ));
        // 1000 ms after the cycle the counter has wrapped; transmit fires.
        assert_eq!(
            scheduler.poll(start.wrapping_add(1_000)),
            SchedulerEvent::Transmit
        );
    }
}

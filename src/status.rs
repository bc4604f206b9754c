//! Status LED signalling
//!
//! The node's only user-visible output is a single active-low LED. Each
//! outcome maps to a fixed on/off pattern so init and per-cycle results can
//! be read off the hardware without a serial console.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

/// Every signal the node can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPattern {
    /// All peripherals came up
    InitSuccess,
    /// A sensor failed to initialise; node continues degraded
    SensorInitFailure,
    /// The radio failed to initialise; fatal, looped forever by the caller
    RadioInitFailure,
    /// Packet handed to the radio successfully
    TransmitSuccess,
    /// Packet dropped this cycle
    TransmitFailure,
    /// Periodic liveness blink while no cycle is firing
    IdleHeartbeat,
}

/// Fixed blink sequence for one pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blink {
    /// Number of on/off toggles
    pub count: u8,
    /// LED-on time per toggle, milliseconds
    pub on_ms: u32,
    /// LED-off time per toggle, milliseconds
    pub off_ms: u32,
}

impl StatusPattern {
    /// The blink sequence for this pattern.
    ///
    /// Counts and durations are fixed; distinctness between the failure
    /// patterns is what makes them readable in the field.
    pub const fn blink(self) -> Blink {
        match self {
            StatusPattern::InitSuccess => Blink { count: 3, on_ms: 100, off_ms: 100 },
            StatusPattern::SensorInitFailure => Blink { count: 2, on_ms: 500, off_ms: 500 },
            StatusPattern::RadioInitFailure => Blink { count: 5, on_ms: 100, off_ms: 100 },
            StatusPattern::TransmitSuccess => Blink { count: 1, on_ms: 50, off_ms: 50 },
            StatusPattern::TransmitFailure => Blink { count: 3, on_ms: 250, off_ms: 250 },
            StatusPattern::IdleHeartbeat => Blink { count: 1, on_ms: 30, off_ms: 0 },
        }
    }
}

/// Driver for the active-low status LED.
///
/// Generic over the pin and delay so the blink sequencing is testable with
/// recording mocks on the host.
pub struct StatusLed<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> StatusLed<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the LED pin. The LED starts off.
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high(); // active low: high = off
        Self { pin, delay }
    }

    /// Play one pattern to completion.
    ///
    /// Blocks only for the pattern's own fixed duration; the main loop calls
    /// this between polls, never during one.
    pub async fn signal(&mut self, pattern: StatusPattern) {
        let blink = pattern.blink();
        for _ in 0..blink.count {
            let _ = self.pin.set_low(); // LED on
            self.delay.delay_ms(blink.on_ms).await;
            let _ = self.pin.set_high(); // LED off
            if blink.off_ms > 0 {
                self.delay.delay_ms(blink.off_ms).await;
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    //! Recording pin and no-op delay for host tests

    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};
    use embedded_hal_async::delay::DelayNs;
    use heapless::Vec;

    /// Pin that records every level transition
    #[derive(Default)]
    pub struct RecordingPin {
        /// true = driven high
        pub transitions: RefCell<Vec<bool, 64>>,
    }

    impl ErrorType for &RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for &RecordingPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let _ = self.transitions.borrow_mut().push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let _ = self.transitions.borrow_mut().push(true);
            Ok(())
        }
    }

    /// Delay that returns immediately but records requested durations
    #[derive(Default)]
    pub struct InstantDelay {
        pub requested_ms: RefCell<Vec<u32, 64>>,
    }

    impl DelayNs for &InstantDelay {
        async fn delay_ns(&mut self, ns: u32) {
            let _ = self.requested_ms.borrow_mut().push(ns / 1_000_000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{InstantDelay, RecordingPin};
    use super::*;

    #[test]
    fn test_patterns_are_distinct() {
        let patterns = [
            StatusPattern::InitSuccess,
            StatusPattern::SensorInitFailure,
            StatusPattern::RadioInitFailure,
            StatusPattern::TransmitSuccess,
            StatusPattern::TransmitFailure,
            StatusPattern::IdleHeartbeat,
        ];

        for (i, a) in patterns.iter().enumerate() {
            for b in patterns.iter().skip(i + 1) {
                assert_ne!(a.blink(), b.blink(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_signal_toggles_led_count_times() {
        let pin = RecordingPin::default();
        let delay = InstantDelay::default();

        futures::executor::block_on(async {
            let mut led = StatusLed::new(&pin, &delay);
            led.signal(StatusPattern::InitSuccess).await;
        });

        // Initial off, then (on, off) x 3, active low.
        let transitions = pin.transitions.borrow();
        assert_eq!(
            transitions.as_slice(),
            &[true, false, true, false, true, false, true]
        );
    }

    #[test]
    fn test_signal_uses_pattern_durations() {
        let pin = RecordingPin::default();
        let delay = InstantDelay::default();

        futures::executor::block_on(async {
            let mut led = StatusLed::new(&pin, &delay);
            led.signal(StatusPattern::TransmitFailure).await;
        });

        let requested = delay.requested_ms.borrow();
        assert_eq!(requested.as_slice(), &[250, 250, 250, 250, 250, 250]);
    }

    #[test]
    fn test_heartbeat_skips_off_delay() {
        let pin = RecordingPin::default();
        let delay = InstantDelay::default();

        futures::executor::block_on(async {
            let mut led = StatusLed::new(&pin, &delay);
            led.signal(StatusPattern::IdleHeartbeat).await;
        });

        assert_eq!(delay.requested_ms.borrow().as_slice(), &[30]);
    }
}

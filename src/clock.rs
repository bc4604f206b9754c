//! Core clock scaling for battery operation
//!
//! The node runs its core clock divided down to cut power draw. The
//! millisecond tick counter slows by the same factor, so every base interval
//! is divided by the factor once at boot and all elapsed-time arithmetic
//! stays correct in real-world seconds. This is a fixed configuration step
//! with no failure path; the divisor never changes after boot.
//!
//! The CPU clock itself is selected inside `esp_hal::init`, before any
//! interrupt is enabled, so the clock register write cannot be torn.

/// Core clock divisor applied at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockScale {
    /// Undivided clock
    Full,
    /// Clock divided by 8
    Div8,
}

/// The scale the firmware ships with
pub const ACTIVE_SCALE: ClockScale = ClockScale::Div8;

impl ClockScale {
    /// The integer divisor, always positive.
    pub const fn factor(self) -> u32 {
        match self {
            ClockScale::Full => 1,
            ClockScale::Div8 => 8,
        }
    }

    /// Divide a nominal interval so its wall-clock period is preserved
    /// under the slowed tick counter.
    pub const fn scaled_interval(self, base_ms: u32) -> u32 {
        base_ms / self.factor()
    }
}

/// Millisecond tick source matching the active clock scale.
///
/// Reports `Instant` milliseconds divided by the scale factor, truncated to
/// the wrapping u32 counter the scheduler expects, exactly like a hardware
/// counter ticking slower under the divided clock.
#[cfg(feature = "embedded")]
pub struct ScaledTicks {
    scale: ClockScale,
}

#[cfg(feature = "embedded")]
impl ScaledTicks {
    pub fn new(scale: ClockScale) -> Self {
        Self { scale }
    }

    /// Current tick count in scaled milliseconds.
    pub fn now_ms(&self) -> u32 {
        let ms = embassy_time::Instant::now().as_millis() / self.scale.factor() as u64;
        ms as u32
    }
}

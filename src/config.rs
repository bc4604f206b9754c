//! Hardware configuration constants for the ESP32-S3 weather node

/// Status LED pin
pub mod led {
    pub const PIN: u8 = 48;
}

/// SPI pins for the NRF24L01 radio
pub mod spi {
    pub const SCLK: u8 = 7;
    pub const MISO: u8 = 8;
    pub const MOSI: u8 = 9;
}

/// NRF24L01 control pins
pub mod radio_pins {
    pub const CE: u8 = 41;
    pub const CSN: u8 = 40;
}

/// I2C buses for the environment sensor and the wind vane
pub mod i2c {
    /// BME280 bus
    pub const ENV_SDA: u8 = 4;
    pub const ENV_SCL: u8 = 5;
    /// AS5600 bus
    pub const VANE_SDA: u8 = 16;
    pub const VANE_SCL: u8 = 17;
}

/// Analog input for the anemometer
pub mod wind_adc {
    pub const PIN: u8 = 1;
}

/// Radio link configuration
///
/// These must match the receiver exactly. There is no handshake: a mismatch
/// in any of them means silent total packet loss.
pub mod radio_link {
    /// RF channel (2400 + n MHz)
    pub const CHANNEL: u8 = 76;

    /// Writing pipe address, shared with the receiver's reading pipe
    pub const PIPE_ADDRESS: [u8; 5] = *b"00001";

    /// NRF24L01 hardware payload limit in bytes
    pub const MAX_PAYLOAD: usize = 32;
}

/// Timing configuration
///
/// Base intervals are divided once by the clock scale factor at boot; see
/// [`crate::clock`].
pub mod intervals {
    /// Time between sensor-read/transmit cycles, at full clock
    pub const TRANSMISSION_BASE_MS: u32 = 60_000;

    /// Time between status log lines, at full clock
    pub const STATUS_LOG_BASE_MS: u32 = 10_000;

    /// Idle heartbeat period, at full clock
    pub const HEARTBEAT_BASE_MS: u32 = 2_000;

    /// Pause per main loop iteration to avoid a tight spin
    pub const LOOP_PAUSE_MS: u32 = 20;

    /// Settling pause after peripheral init
    pub const BOOT_SETTLE_MS: u32 = 100;
}

/// Transmit retry configuration for the acknowledged policy
pub mod retry {
    pub const ATTEMPTS: u8 = 3;
    pub const DELAY_MS: u32 = 50;
}

/// Calibration constants, fixed per hardware build
pub mod calibration {
    /// ADC reference in millivolts
    pub const ADC_REF_MV: u32 = 3300;

    /// Full-scale raw ADC value for the anemometer input
    pub const ADC_MAX: u16 = 1023;

    /// Zero-point correction added to the raw anemometer reading
    pub const WIND_RAW_OFFSET: i16 = -14;

    /// Anemometer voltage divider, input side (ohms)
    pub const WIND_DIVIDER_R1: u32 = 10_000;

    /// Anemometer voltage divider, measured side (ohms)
    pub const WIND_DIVIDER_R2: u32 = 10_000;

    /// Anemometer transfer slope: hundredths of km/h per volt at the
    /// sensor's output, before the divider
    pub const WIND_CENTI_KMH_PER_VOLT: u32 = 3_500;

    /// Wind vane mounting correction, raw AS5600 counts (0..4096)
    pub const ANGLE_RAW_OFFSET: u16 = 2_275;
}

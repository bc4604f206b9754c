//! Sensor acquisition with per-sensor degradation
//!
//! Each cycle reads every sensor through its trait seam, converts to report
//! units, and clamps. A sensor that failed to initialise (or fails a read)
//! contributes its documented sentinel for that cycle; the node keeps
//! running and keeps transmitting, preferring partial data over none.

use core::future::Future;

use crate::packet::{
    SensorReading, HUMIDITY_SENTINEL, PRESSURE_SENTINEL, TEMPERATURE_SENTINEL,
    WIND_DIRECTION_SENTINEL,
};
use crate::sensors::conversion;

/// Errors that can occur during sensor bus operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed
    BusError,
    /// Device absent or wrong chip identity
    NotResponding,
    /// Device responded with data it documents as invalid
    InvalidData,
}

/// Compensated environment sensor output, in report units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentSample {
    /// Hundredths of a degree Celsius
    pub temperature_centi_c: i32,
    /// Pascals
    pub pressure_pa: u32,
    /// Percent
    pub humidity_pct: u16,
}

/// Pressure/temperature/humidity sensor (BME280 on hardware)
pub trait EnvironmentSensor {
    /// Probe and configure the device.
    fn begin(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// One compensated measurement.
    fn read(&mut self) -> impl Future<Output = Result<EnvironmentSample, SensorError>>;
}

/// Rotary magnetic-angle sensor for the wind vane (AS5600 on hardware)
pub trait AngleSensor {
    /// Probe the device and check magnet presence.
    fn begin(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Raw angle, 0-4095.
    fn read_raw_angle(&mut self) -> impl Future<Output = Result<u16, SensorError>>;
}

/// Analog anemometer input.
///
/// Always present; a plain ADC read with no failure path, which is why wind
/// speed has no "unavailable" sentinel.
pub trait WindAnemometer {
    /// Raw ADC reading, 0-1023.
    fn read_raw(&mut self) -> u16;
}

/// Per-sensor availability, set once during startup and read every cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitializationStatus {
    pub environment: bool,
    pub wind_vane: bool,
}

impl InitializationStatus {
    /// True when every optional sensor came up.
    pub fn all_ok(&self) -> bool {
        self.environment && self.wind_vane
    }
}

/// Owns the sensor peripherals for the node's lifetime.
pub struct SensorAcquisition<E, A, W> {
    environment: E,
    wind_vane: A,
    anemometer: W,
    init: InitializationStatus,
}

impl<E, A, W> SensorAcquisition<E, A, W>
where
    E: EnvironmentSensor,
    A: AngleSensor,
    W: WindAnemometer,
{
    pub fn new(environment: E, wind_vane: A, anemometer: W) -> Self {
        Self {
            environment,
            wind_vane,
            anemometer,
            init: InitializationStatus::default(),
        }
    }

    /// Run each sensor's `begin` once and record what is available.
    ///
    /// Failures here are degraded-mode, not fatal: the affected sensor
    /// substitutes sentinels indefinitely and is never re-probed.
    pub async fn init(&mut self) -> InitializationStatus {
        self.init.environment = match self.environment.begin().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("environment sensor init failed: {:?}", e);
                false
            }
        };

        self.init.wind_vane = match self.wind_vane.begin().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("wind vane init failed: {:?}", e);
                false
            }
        };

        self.init
    }

    /// Availability flags recorded at startup.
    pub fn status(&self) -> InitializationStatus {
        self.init
    }

    /// Read every sensor and produce one fully clamped reading.
    ///
    /// A handful of bounded bus transactions; cheap enough to run on every
    /// expired transmission timer without stalling the loop.
    pub async fn read_all(&mut self) -> SensorReading {
        let (temperature_centi_c, pressure_pa, humidity_pct) = if self.init.environment {
            match self.environment.read().await {
                Ok(sample) => (
                    conversion::clamp_temperature(sample.temperature_centi_c),
                    conversion::clamp_pressure(sample.pressure_pa),
                    conversion::clamp_humidity(sample.humidity_pct),
                ),
                Err(e) => {
                    log::warn!("environment read failed: {:?}", e);
                    (TEMPERATURE_SENTINEL, PRESSURE_SENTINEL, HUMIDITY_SENTINEL)
                }
            }
        } else {
            (TEMPERATURE_SENTINEL, PRESSURE_SENTINEL, HUMIDITY_SENTINEL)
        };

        let wind_direction_deg = if self.init.wind_vane {
            match self.wind_vane.read_raw_angle().await {
                Ok(raw) => conversion::angle_to_degrees(raw),
                Err(e) => {
                    log::warn!("wind vane read failed: {:?}", e);
                    WIND_DIRECTION_SENTINEL
                }
            }
        } else {
            WIND_DIRECTION_SENTINEL
        };

        let wind_speed_centi_kmh =
            conversion::wind_raw_to_centi_kmh(self.anemometer.read_raw());

        SensorReading {
            temperature_centi_c,
            pressure_pa,
            humidity_pct,
            wind_direction_deg,
            wind_speed_centi_kmh,
        }
    }
}

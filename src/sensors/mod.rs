//! Sensor traits, conversions, and hardware adapters

pub mod acquisition;
pub mod conversion;

// Hardware adapters need the esp-hal/embassy stack
#[cfg(feature = "embedded")]
pub mod as5600;
#[cfg(feature = "embedded")]
pub mod bme280;
#[cfg(feature = "embedded")]
pub mod wind;

pub use acquisition::{
    AngleSensor, EnvironmentSample, EnvironmentSensor, InitializationStatus, SensorAcquisition,
    SensorError, WindAnemometer,
};

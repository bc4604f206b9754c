//! Radio link: trait seam plus the NRF24L01 hardware driver

#[cfg(feature = "embedded")]
pub mod nrf24;
pub mod traits;

pub use traits::{DataRate, PaLevel, Radio, RadioConfig, RadioError};

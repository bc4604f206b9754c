//! Anemometer ADC adapter
//!
//! The wind-speed sensor is a plain analog voltage behind a divider. The
//! ESP32-S3 ADC is 12-bit; readings are scaled down to the 10-bit domain
//! the calibration constants in [`crate::config::calibration`] are written
//! for.

use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::{ADC1, GPIO1};
use esp_hal::Blocking;

use crate::config::calibration::ADC_MAX;
use crate::sensors::acquisition::WindAnemometer;

/// Anemometer input on ADC1
pub struct WindAdc<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
}

impl<'d> WindAdc<'d> {
    pub fn new(adc: Adc<'d, ADC1<'d>, Blocking>, pin: AdcPin<GPIO1<'d>, ADC1<'d>>) -> Self {
        Self { adc, pin }
    }
}

impl WindAnemometer for WindAdc<'_> {
    fn read_raw(&mut self) -> u16 {
        // read_oneshot signals an in-progress conversion as WouldBlock;
        // block! polls it to completion, a bounded busy-wait of a few
        // microseconds. Only a genuine conversion error reads as zero.
        let sample = match nb::block!(self.adc.read_oneshot(&mut self.pin)) {
            Ok(value) => value,
            Err(_) => 0,
        };

        // 12-bit hardware range down to the 10-bit calibration domain
        (sample >> 2).min(ADC_MAX)
    }
}

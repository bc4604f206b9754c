//! Raw-value conversion and range clamping
//!
//! Pure functions only: same raw input, same output, every time. This is
//! the single validation boundary for the wire format; nothing leaves this
//! module out of its documented range, so the packet encoder never clamps.

use crate::config::calibration::{
    ADC_MAX, ADC_REF_MV, ANGLE_RAW_OFFSET, WIND_CENTI_KMH_PER_VOLT, WIND_DIVIDER_R1,
    WIND_DIVIDER_R2, WIND_RAW_OFFSET,
};

/// AS5600 full-scale raw angle count
const ANGLE_RAW_FULL_SCALE: u32 = 4096;

/// Temperature clamp range in hundredths of a degree (BME280 operating range)
pub const TEMPERATURE_MIN_CENTI_C: i32 = -4_000;
pub const TEMPERATURE_MAX_CENTI_C: i32 = 8_500;

/// Pressure clamp range in pascals (BME280 operating range)
pub const PRESSURE_MIN_PA: u32 = 30_000;
pub const PRESSURE_MAX_PA: u32 = 110_000;

/// Humidity clamp ceiling in percent
pub const HUMIDITY_MAX_PCT: u16 = 100;

/// Wind speed clamp ceiling in hundredths of km/h (1000 km/h)
pub const WIND_SPEED_MAX_CENTI_KMH: i32 = 100_000;

/// Convert a raw AS5600 angle (0-4095) to compass degrees (0-359).
///
/// The fixed mounting offset is applied modulo the sensor's full scale
/// before scaling, with round-to-nearest on the degree conversion.
pub fn angle_to_degrees(raw: u16) -> u16 {
    let adjusted = (raw as u32 + ANGLE_RAW_OFFSET as u32) % ANGLE_RAW_FULL_SCALE;
    let degrees = (adjusted * 360 + ANGLE_RAW_FULL_SCALE / 2) / ANGLE_RAW_FULL_SCALE;
    (degrees % 360) as u16
}

/// Convert a raw anemometer ADC reading (0-1023) to hundredths of km/h.
///
/// The zero-point offset is applied first and the result clamped back into
/// the ADC domain, then: raw -> millivolts at the divider tap -> sensor
/// output voltage via the divider inverse -> km/h via the calibration
/// slope. The final value is clamped to [0, 1000] km/h.
pub fn wind_raw_to_centi_kmh(raw: u16) -> i32 {
    let corrected = (raw as i32 + WIND_RAW_OFFSET as i32).clamp(0, ADC_MAX as i32) as u32;

    let tap_mv = corrected * ADC_REF_MV / ADC_MAX as u32;
    let sensor_mv = tap_mv * (WIND_DIVIDER_R1 + WIND_DIVIDER_R2) / WIND_DIVIDER_R2;
    let centi_kmh = (sensor_mv * WIND_CENTI_KMH_PER_VOLT / 1_000) as i32;

    centi_kmh.clamp(0, WIND_SPEED_MAX_CENTI_KMH)
}

/// Clamp a compensated temperature into the sensor's documented range.
pub fn clamp_temperature(centi_c: i32) -> i32 {
    centi_c.clamp(TEMPERATURE_MIN_CENTI_C, TEMPERATURE_MAX_CENTI_C)
}

/// Clamp a compensated pressure into the sensor's documented range.
pub fn clamp_pressure(pa: u32) -> u32 {
    pa.clamp(PRESSURE_MIN_PA, PRESSURE_MAX_PA)
}

/// Clamp a compensated humidity to 0-100 %.
pub fn clamp_humidity(pct: u16) -> u16 {
    pct.min(HUMIDITY_MAX_PCT)
}

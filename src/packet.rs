//! Binary wire format for sensor readings
//!
//! # Packet Layout
//!
//! Every transmission carries exactly one 16-byte packet, little-endian,
//! no padding:
//!
//! ```text
//! [temperature: i32][pressure: u32][humidity: u16][wind_dir: u16][wind_speed: i32]
//! ```
//!
//! | Offset | Width | Type | Field          | Units              |
//! |--------|-------|------|----------------|--------------------|
//! | 0      | 4     | i32  | temperature    | hundredths of °C   |
//! | 4      | 4     | u32  | pressure       | pascals            |
//! | 8      | 2     | u16  | humidity       | percent (0-100)    |
//! | 10     | 2     | u16  | wind direction | degrees (0-359)    |
//! | 12     | 4     | i32  | wind speed     | hundredths of km/h |
//!
//! This layout is the sole contract between the node and the receiver.
//! There is no version field, so any change here breaks the receiver
//! silently; the shape is frozen unless both ends move in lockstep.

use crate::config::radio_link::MAX_PAYLOAD;

/// Size of the encoded packet in bytes
pub const WIRE_PACKET_LEN: usize = 16;

/// Encoded sensor packet, ready for the radio
pub type WirePacket = [u8; WIRE_PACKET_LEN];

// The radio payload is hard-limited by the NRF24L01 FIFO.
const _: () = assert!(WIRE_PACKET_LEN <= MAX_PAYLOAD);

/// Sentinel written when the environment sensor is unavailable.
///
/// -999 hundredths (-9.99 °C) is inside the physical range, so the receiver
/// cannot distinguish it from a cold day with certainty; it is the
/// documented "sensor down" marker inherited from the original protocol.
pub const TEMPERATURE_SENTINEL: i32 = -999;

/// Pressure sentinel when the environment sensor is unavailable
pub const PRESSURE_SENTINEL: u32 = 0;

/// Humidity sentinel when the environment sensor is unavailable
pub const HUMIDITY_SENTINEL: u16 = 0;

/// Wind direction sentinel when the vane is unavailable
pub const WIND_DIRECTION_SENTINEL: u16 = 0;

/// One cycle's worth of sensor data, already converted and clamped.
///
/// All fields are fixed-point integers; no floating point crosses the wire.
/// Range enforcement happens in [`crate::sensors`] before a reading is
/// constructed. Encoding never clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    /// Hundredths of a degree Celsius
    pub temperature_centi_c: i32,
    /// Pascals
    pub pressure_pa: u32,
    /// Percent, 0-100
    pub humidity_pct: u16,
    /// Degrees, 0-359
    pub wind_direction_deg: u16,
    /// Hundredths of km/h
    pub wind_speed_centi_kmh: i32,
}

impl SensorReading {
    /// Encode into the fixed wire layout.
    ///
    /// Pure and infallible: every (already clamped) reading maps to exactly
    /// one valid packet.
    pub fn encode(&self) -> WirePacket {
        let mut packet = [0u8; WIRE_PACKET_LEN];
        packet[0..4].copy_from_slice(&self.temperature_centi_c.to_le_bytes());
        packet[4..8].copy_from_slice(&self.pressure_pa.to_le_bytes());
        packet[8..10].copy_from_slice(&self.humidity_pct.to_le_bytes());
        packet[10..12].copy_from_slice(&self.wind_direction_deg.to_le_bytes());
        packet[12..16].copy_from_slice(&self.wind_speed_centi_kmh.to_le_bytes());
        packet
    }

    /// Decode a packet back into a reading.
    ///
    /// This is the receiver's view of the contract; the node itself only
    /// encodes. Kept here so the round-trip law is testable in one place.
    pub fn decode(packet: &WirePacket) -> Self {
        Self {
            temperature_centi_c: i32::from_le_bytes([packet[0], packet[1], packet[2], packet[3]]),
            pressure_pa: u32::from_le_bytes([packet[4], packet[5], packet[6], packet[7]]),
            humidity_pct: u16::from_le_bytes([packet[8], packet[9]]),
            wind_direction_deg: u16::from_le_bytes([packet[10], packet[11]]),
            wind_speed_centi_kmh: i32::from_le_bytes([packet[12], packet[13], packet[14], packet[15]]),
        }
    }

    /// Reading produced when every optional sensor is down.
    ///
    /// Wind speed still carries a real value because the anemometer is an
    /// always-present analog input.
    pub fn degraded(wind_speed_centi_kmh: i32) -> Self {
        Self {
            temperature_centi_c: TEMPERATURE_SENTINEL,
            pressure_pa: PRESSURE_SENTINEL,
            humidity_pct: HUMIDITY_SENTINEL,
            wind_direction_deg: WIND_DIRECTION_SENTINEL,
            wind_speed_centi_kmh,
        }
    }
}

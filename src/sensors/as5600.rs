//! AS5600 wind vane adapter
//!
//! Minimal I2C driver for the magnetic rotary encoder: probe for a detected
//! magnet at init, then read the 12-bit raw angle each cycle. Calibration
//! offset and degree scaling live in [`crate::sensors::conversion`].

use embedded_hal_async::i2c::I2c;

use crate::sensors::acquisition::{AngleSensor, SensorError};

/// Fixed I2C address of the AS5600
pub const I2C_ADDRESS: u8 = 0x36;

/// AS5600 register addresses
mod reg {
    pub const STATUS: u8 = 0x0B;
    pub const RAW_ANGLE_H: u8 = 0x0C;
}

/// STATUS bit: magnet detected
const STATUS_MD: u8 = 0x20;

/// AS5600 driver over an owned I2C bus
pub struct As5600<I2C> {
    i2c: I2C,
    initialised: bool,
}

impl<I2C: I2c> As5600<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            initialised: false,
        }
    }

    async fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(I2C_ADDRESS, &[start], buf)
            .await
            .map_err(|_| SensorError::BusError)
    }
}

impl<I2C: I2c> AngleSensor for As5600<I2C> {
    async fn begin(&mut self) -> Result<(), SensorError> {
        let mut status = [0u8; 1];
        self.read_registers(reg::STATUS, &mut status).await?;

        // Without a magnet the angle output is meaningless; treat it the
        // same as an absent device.
        if status[0] & STATUS_MD == 0 {
            return Err(SensorError::NotResponding);
        }

        self.initialised = true;
        Ok(())
    }

    async fn read_raw_angle(&mut self) -> Result<u16, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotResponding);
        }

        let mut raw = [0u8; 2];
        self.read_registers(reg::RAW_ANGLE_H, &mut raw).await?;

        // 12-bit value, high byte first
        Ok((((raw[0] as u16) << 8) | raw[1] as u16) & 0x0FFF)
    }
}

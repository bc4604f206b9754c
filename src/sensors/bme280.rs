//! BME280 environment sensor adapter
//!
//! Register-level I2C driver implementing the [`EnvironmentSensor`] trait.
//! Uses the datasheet's integer compensation, whose outputs are natively
//! hundredths of °C, pascals, and %RH, so the node stays float-free end to
//! end.

use embassy_time::{Duration, Timer};
use embedded_hal_async::i2c::I2c;

use crate::sensors::acquisition::{EnvironmentSample, EnvironmentSensor, SensorError};

/// Default I2C address (SDO low)
pub const I2C_ADDRESS: u8 = 0x76;

/// BME280 register addresses
mod reg {
    pub const ID: u8 = 0xD0;
    pub const RESET: u8 = 0xE0;
    pub const CTRL_HUM: u8 = 0xF2;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const CONFIG: u8 = 0xF5;
    pub const DATA_START: u8 = 0xF7;
    pub const CALIB_TP_START: u8 = 0x88;
    pub const CALIB_H1: u8 = 0xA1;
    pub const CALIB_H_START: u8 = 0xE1;
}

/// Fixed register values
mod val {
    /// Chip identity for the BME280
    pub const CHIP_ID: u8 = 0x60;
    /// Soft-reset magic
    pub const RESET_CMD: u8 = 0xB6;
    /// Humidity oversampling x1
    pub const CTRL_HUM_X1: u8 = 0x01;
    /// Temperature x1, pressure x1, normal mode
    pub const CTRL_MEAS_X1_NORMAL: u8 = 0x27;
    /// 1000 ms standby, filter off
    pub const CONFIG_STANDBY_1000MS: u8 = 0xA0;
}

/// Raw temperature value when the measurement was skipped
const TEMP_SKIPPED: i32 = 0x80000;

/// Trimming parameters read from the device at init
#[derive(Debug, Default, Clone, Copy)]
struct Calibration {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
    dig_h1: u8,
    dig_h2: i16,
    dig_h3: u8,
    dig_h4: i16,
    dig_h5: i16,
    dig_h6: i8,
}

/// BME280 driver over an owned I2C bus
pub struct Bme280<I2C> {
    i2c: I2C,
    address: u8,
    calibration: Calibration,
    /// Fine temperature carried from the temperature compensation into the
    /// pressure and humidity compensation of the same measurement
    t_fine: i32,
    initialised: bool,
}

impl<I2C: I2c> Bme280<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS,
            calibration: Calibration::default(),
            t_fine: 0,
            initialised: false,
        }
    }

    async fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[start], buf)
            .await
            .map_err(|_| SensorError::BusError)
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(|_| SensorError::BusError)
    }

    async fn read_calibration(&mut self) -> Result<(), SensorError> {
        let mut tp = [0u8; 24];
        self.read_registers(reg::CALIB_TP_START, &mut tp).await?;

        let mut h1 = [0u8; 1];
        self.read_registers(reg::CALIB_H1, &mut h1).await?;

        let mut h = [0u8; 7];
        self.read_registers(reg::CALIB_H_START, &mut h).await?;

        let u16le = |lo: u8, hi: u8| u16::from_le_bytes([lo, hi]);
        let i16le = |lo: u8, hi: u8| i16::from_le_bytes([lo, hi]);

        self.calibration = Calibration {
            dig_t1: u16le(tp[0], tp[1]),
            dig_t2: i16le(tp[2], tp[3]),
            dig_t3: i16le(tp[4], tp[5]),
            dig_p1: u16le(tp[6], tp[7]),
            dig_p2: i16le(tp[8], tp[9]),
            dig_p3: i16le(tp[10], tp[11]),
            dig_p4: i16le(tp[12], tp[13]),
            dig_p5: i16le(tp[14], tp[15]),
            dig_p6: i16le(tp[16], tp[17]),
            dig_p7: i16le(tp[18], tp[19]),
            dig_p8: i16le(tp[20], tp[21]),
            dig_p9: i16le(tp[22], tp[23]),
            dig_h1: h1[0],
            dig_h2: i16le(h[0], h[1]),
            dig_h3: h[2],
            // H4/H5 share the nibble at 0xE5
            dig_h4: ((h[3] as i8 as i16) << 4) | (h[4] & 0x0F) as i16,
            dig_h5: ((h[5] as i8 as i16) << 4) | ((h[4] >> 4) & 0x0F) as i16,
            dig_h6: h[6] as i8,
        };

        Ok(())
    }

    /// Datasheet BME280_compensate_T_int32; result in 0.01 °C.
    ///
    /// Also latches `t_fine` for the pressure/humidity compensation.
    fn compensate_temperature(&mut self, adc_t: i32) -> i32 {
        let c = &self.calibration;
        let var1 = (((adc_t >> 3) - ((c.dig_t1 as i32) << 1)) * (c.dig_t2 as i32)) >> 11;
        let var2 = (((((adc_t >> 4) - (c.dig_t1 as i32)) * ((adc_t >> 4) - (c.dig_t1 as i32)))
            >> 12)
            * (c.dig_t3 as i32))
            >> 14;
        self.t_fine = var1 + var2;
        (self.t_fine * 5 + 128) >> 8
    }

    /// Datasheet BME280_compensate_P_int64; result in pascals.
    fn compensate_pressure(&self, adc_p: i32) -> u32 {
        let c = &self.calibration;
        let mut var1 = (self.t_fine as i64) - 128_000;
        let mut var2 = var1 * var1 * (c.dig_p6 as i64);
        var2 += (var1 * (c.dig_p5 as i64)) << 17;
        var2 += (c.dig_p4 as i64) << 35;
        var1 = ((var1 * var1 * (c.dig_p3 as i64)) >> 8) + ((var1 * (c.dig_p2 as i64)) << 12);
        var1 = (((1i64 << 47) + var1) * (c.dig_p1 as i64)) >> 33;
        if var1 == 0 {
            return 0;
        }

        let mut p: i64 = 1_048_576 - adc_p as i64;
        p = (((p << 31) - var2) * 3_125) / var1;
        var1 = ((c.dig_p9 as i64) * (p >> 13) * (p >> 13)) >> 25;
        var2 = ((c.dig_p8 as i64) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + ((c.dig_p7 as i64) << 4);

        // p is Q24.8 pascals
        (p >> 8) as u32
    }

    /// Datasheet bme280_compensate_H_int32; result in percent.
    fn compensate_humidity(&self, adc_h: i32) -> u16 {
        let c = &self.calibration;
        let mut v: i32 = self.t_fine - 76_800;
        v = ((((adc_h << 14) - ((c.dig_h4 as i32) << 20) - ((c.dig_h5 as i32) * v)) + 16_384)
            >> 15)
            * (((((((v * (c.dig_h6 as i32)) >> 10)
                * (((v * (c.dig_h3 as i32)) >> 11) + 32_768))
                >> 10)
                + 2_097_152)
                * (c.dig_h2 as i32)
                + 8_192)
                >> 14);
        v -= ((((v >> 15) * (v >> 15)) >> 7) * (c.dig_h1 as i32)) >> 4;
        v = v.clamp(0, 419_430_400);

        // (v >> 12) is %RH in Q22.10
        (((v as u32) >> 12) >> 10) as u16
    }
}

impl<I2C: I2c> EnvironmentSensor for Bme280<I2C> {
    async fn begin(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.read_registers(reg::ID, &mut id).await?;
        if id[0] != val::CHIP_ID {
            return Err(SensorError::NotResponding);
        }

        self.write_register(reg::RESET, val::RESET_CMD).await?;
        Timer::after(Duration::from_millis(10)).await;

        self.read_calibration().await?;

        self.write_register(reg::CTRL_HUM, val::CTRL_HUM_X1).await?;
        self.write_register(reg::CTRL_MEAS, val::CTRL_MEAS_X1_NORMAL)
            .await?;
        self.write_register(reg::CONFIG, val::CONFIG_STANDBY_1000MS)
            .await?;

        self.initialised = true;
        Ok(())
    }

    async fn read(&mut self) -> Result<EnvironmentSample, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotResponding);
        }

        // Burst read: pressure (3), temperature (3), humidity (2)
        let mut data = [0u8; 8];
        self.read_registers(reg::DATA_START, &mut data).await?;

        let adc_p =
            ((data[0] as i32) << 12) | ((data[1] as i32) << 4) | ((data[2] as i32) >> 4);
        let adc_t =
            ((data[3] as i32) << 12) | ((data[4] as i32) << 4) | ((data[5] as i32) >> 4);
        let adc_h = ((data[6] as i32) << 8) | (data[7] as i32);

        if adc_t == TEMP_SKIPPED {
            return Err(SensorError::InvalidData);
        }

        // Temperature first: it latches t_fine for the other two.
        let temperature_centi_c = self.compensate_temperature(adc_t);
        let pressure_pa = self.compensate_pressure(adc_p);
        let humidity_pct = self.compensate_humidity(adc_h);

        Ok(EnvironmentSample {
            temperature_centi_c,
            pressure_pa,
            humidity_pct,
        })
    }
}

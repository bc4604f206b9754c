//! NRF24L01+ radio driver
//!
//! Transmit-only register-level driver implementing the [`Radio`] trait.
//! Uses the async SpiBus trait with manual CSN control; CE gates the RF
//! front end around each transmission.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

use crate::radio::traits::{DataRate, PaLevel, Radio, RadioConfig, RadioError};

/// SPI command opcodes
mod cmd {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const NOP: u8 = 0xFF;
}

/// Register addresses
mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const TX_ADDR: u8 = 0x10;
    pub const FIFO_STATUS: u8 = 0x17;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

/// CONFIG register bits
mod config_bits {
    pub const EN_CRC: u8 = 0x08;
    pub const CRCO: u8 = 0x04;
    pub const PWR_UP: u8 = 0x02;
}

/// STATUS register bits
mod status_bits {
    pub const TX_DS: u8 = 0x20;
    pub const MAX_RT: u8 = 0x10;
    pub const TX_FULL: u8 = 0x01;
}

/// RF_SETUP register bits
mod rf_setup_bits {
    pub const RF_DR_LOW: u8 = 0x20;
    pub const RF_DR_HIGH: u8 = 0x08;
}

/// FEATURE register bits
mod feature_bits {
    pub const EN_DPL: u8 = 0x04;
}

/// Auto-retransmit: 1500 us delay, 15 retries (hardware retry under the
/// acknowledged policy; zeroed under fire-and-forget)
const SETUP_RETR_ACK: u8 = 0x5F;

/// Polls of the STATUS register before a transmission is declared hung.
/// At 250 kbps a 32-byte payload is on air for ~5 ms; 100 x 1 ms covers the
/// worst case with all hardware retries.
const TX_POLL_LIMIT: u32 = 100;

/// Control pins for the NRF24L01
pub struct Nrf24Pins<Ce, Csn> {
    pub ce: Ce,
    pub csn: Csn,
}

/// NRF24L01+ driver
///
/// Implements the Radio trait using dependency injection for SPI and GPIO
/// pins. The radio stays powered up in standby between transmissions; CE is
/// pulsed per packet.
pub struct Nrf24Driver<Spi, Ce, Csn>
where
    Spi: SpiBus,
    Ce: OutputPin,
    Csn: OutputPin,
{
    spi: Spi,
    ce: Ce,
    csn: Csn,
    initialised: bool,
    auto_ack: bool,
}

impl<Spi, Ce, Csn> Nrf24Driver<Spi, Ce, Csn>
where
    Spi: SpiBus,
    Ce: OutputPin,
    Csn: OutputPin,
{
    /// Create a new NRF24L01 driver
    pub fn new(spi: Spi, pins: Nrf24Pins<Ce, Csn>) -> Self {
        Self {
            spi,
            ce: pins.ce,
            csn: pins.csn,
            initialised: false,
            auto_ack: false,
        }
    }

    async fn transfer(&mut self, buf: &mut [u8]) -> Result<(), RadioError> {
        let _ = self.csn.set_low();
        let result = self.spi.transfer_in_place(buf).await;
        let _ = self.csn.set_high();
        result.map_err(|_| RadioError::SpiError)
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, RadioError> {
        let mut buf = [cmd::R_REGISTER | register, cmd::NOP];
        self.transfer(&mut buf).await?;
        Ok(buf[1])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), RadioError> {
        let mut buf = [cmd::W_REGISTER | register, value];
        self.transfer(&mut buf).await
    }

    async fn write_address(&mut self, register: u8, address: &[u8; 5]) -> Result<(), RadioError> {
        let mut buf = [0u8; 6];
        buf[0] = cmd::W_REGISTER | register;
        buf[1..].copy_from_slice(address);
        self.transfer(&mut buf).await
    }

    async fn command(&mut self, opcode: u8) -> Result<(), RadioError> {
        let mut buf = [opcode];
        self.transfer(&mut buf).await
    }

    async fn clear_tx_flags(&mut self) -> Result<(), RadioError> {
        // STATUS flags are cleared by writing them back
        self.write_register(reg::STATUS, status_bits::TX_DS | status_bits::MAX_RT)
            .await
    }
}

impl<Spi, Ce, Csn> Radio for Nrf24Driver<Spi, Ce, Csn>
where
    Spi: SpiBus,
    Ce: OutputPin,
    Csn: OutputPin,
{
    async fn init(&mut self) -> Result<(), RadioError> {
        let _ = self.ce.set_low();
        let _ = self.csn.set_high();

        // Power-on reset settle
        Timer::after(Duration::from_millis(5)).await;

        // 16-bit CRC, power up, TX mode (PRIM_RX clear)
        let config = config_bits::EN_CRC | config_bits::CRCO | config_bits::PWR_UP;
        self.write_register(reg::CONFIG, config).await?;
        Timer::after(Duration::from_millis(5)).await;

        // Read-back distinguishes a present radio from a floating bus.
        if self.read_register(reg::CONFIG).await? != config {
            return Err(RadioError::NotResponding);
        }

        self.command(cmd::FLUSH_TX).await?;
        self.command(cmd::FLUSH_RX).await?;
        self.clear_tx_flags().await?;

        self.initialised = true;
        Ok(())
    }

    async fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        self.write_register(reg::RF_CH, config.channel & 0x7F).await?;

        let rate_bits = match config.data_rate {
            DataRate::Kbps250 => rf_setup_bits::RF_DR_LOW,
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => rf_setup_bits::RF_DR_HIGH,
        };
        let pa_bits = match config.pa_level {
            PaLevel::Min => 0x00,
            PaLevel::Low => 0x02,
            PaLevel::High => 0x04,
            PaLevel::Max => 0x06,
        };
        self.write_register(reg::RF_SETUP, rate_bits | pa_bits).await?;

        // Receiver reads with dynamic payload lengths; both flags must be
        // set on the transmit side too.
        self.write_register(reg::FEATURE, feature_bits::EN_DPL).await?;
        self.write_register(reg::DYNPD, 0x01).await?;

        if config.auto_ack {
            self.write_register(reg::EN_AA, 0x01).await?;
            self.write_register(reg::SETUP_RETR, SETUP_RETR_ACK).await?;
        } else {
            // Fire-and-forget: no ACK expectation, no hardware retries
            self.write_register(reg::EN_AA, 0x00).await?;
            self.write_register(reg::SETUP_RETR, 0x00).await?;
        }
        self.auto_ack = config.auto_ack;

        Ok(())
    }

    async fn open_writing_pipe(&mut self, address: &[u8; 5]) -> Result<(), RadioError> {
        self.write_address(reg::TX_ADDR, address).await?;
        // Pipe 0 must mirror the TX address to hear the ACK
        self.write_address(reg::RX_ADDR_P0, address).await?;
        self.write_register(reg::EN_RXADDR, 0x01).await
    }

    async fn write(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if !self.initialised {
            return Err(RadioError::NotInitialised);
        }

        if self.read_register(reg::FIFO_STATUS).await? & 0x20 != 0 {
            // TX FIFO full bit
            return Err(RadioError::TxFifoFull);
        }

        self.clear_tx_flags().await?;

        // Load the payload
        let mut buf = [0u8; 33];
        buf[0] = cmd::W_TX_PAYLOAD;
        let len = payload.len().min(32);
        buf[1..1 + len].copy_from_slice(&payload[..len]);
        self.transfer(&mut buf[..1 + len]).await?;

        // CE pulse starts the transmission (>10 us required)
        let _ = self.ce.set_high();
        Timer::after(Duration::from_micros(15)).await;
        let _ = self.ce.set_low();

        for _ in 0..TX_POLL_LIMIT {
            let status = self.read_register(reg::STATUS).await?;

            if status & status_bits::TX_DS != 0 {
                self.clear_tx_flags().await?;
                return Ok(());
            }
            if status & status_bits::MAX_RT != 0 {
                // Failed payload stays queued until flushed
                self.command(cmd::FLUSH_TX).await?;
                self.clear_tx_flags().await?;
                return Err(RadioError::NoAck);
            }
            if status & status_bits::TX_FULL != 0 && !self.auto_ack {
                // Without ACKs the FIFO drains as soon as the packet is on
                // air; a stuck full flag means the front end is wedged.
                self.command(cmd::FLUSH_TX).await?;
                return Err(RadioError::TxFifoFull);
            }

            Timer::after(Duration::from_millis(1)).await;
        }

        self.command(cmd::FLUSH_TX).await?;
        self.clear_tx_flags().await?;
        Err(RadioError::TxTimeout)
    }
}

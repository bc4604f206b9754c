//! Radio trait for abstraction and testability
//!
//! This trait defines the interface for the transmit-only radio link,
//! allowing the NRF24L01 hardware driver to be swapped with a mock for
//! testing.

use core::future::Future;

use crate::config::radio_link;

/// Errors that can occur during radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Device absent or not answering on SPI
    NotResponding,
    /// SPI communication error
    SpiError,
    /// TX FIFO rejected the payload
    TxFifoFull,
    /// Hardware retransmit limit reached without an acknowledgement
    NoAck,
    /// Transmission did not complete in time
    TxTimeout,
    /// Radio not initialised
    NotInitialised,
}

/// Air data rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRate {
    /// 250 kbps, the longest-range setting and the one the receiver uses
    Kbps250,
    Mbps1,
    Mbps2,
}

/// Transmit power level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaLevel {
    Min,
    Low,
    High,
    Max,
}

/// Radio link configuration
///
/// Compile-time constants on both ends; any field that disagrees with the
/// receiver means silent total packet loss with no diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    /// RF channel (2400 + n MHz)
    pub channel: u8,
    /// Air data rate
    pub data_rate: DataRate,
    /// Transmit power
    pub pa_level: PaLevel,
    /// Hardware auto-acknowledge and auto-retransmit.
    ///
    /// Off under the fire-and-forget policy; on under acknowledged retry.
    pub auto_ack: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel: radio_link::CHANNEL,
            data_rate: DataRate::Kbps250,
            pa_level: PaLevel::Max,
            auto_ack: false,
        }
    }
}

/// Abstract transmit-only radio interface
///
/// Mirrors the primitives of the off-the-shelf transceiver: initialise,
/// configure channel/rate/power, open a writing pipe, write one payload.
pub trait Radio {
    /// Probe and power up the radio hardware.
    fn init(&mut self) -> impl Future<Output = Result<(), RadioError>>;

    /// Apply the link configuration.
    fn configure(&mut self, config: &RadioConfig) -> impl Future<Output = Result<(), RadioError>>;

    /// Set the transmit pipe address.
    fn open_writing_pipe(
        &mut self,
        address: &[u8; 5],
    ) -> impl Future<Output = Result<(), RadioError>>;

    /// Transmit one payload.
    ///
    /// With auto-ack enabled, `Ok` means the packet was acknowledged and
    /// `Err(NoAck)` that the hardware retransmit limit was exhausted. With
    /// auto-ack disabled, `Ok` only means the TX FIFO accepted the payload.
    fn write(&mut self, payload: &[u8]) -> impl Future<Output = Result<(), RadioError>>;
}

#[cfg(test)]
pub mod mock {
    //! Mock radio for testing

    use super::*;
    use core::cell::RefCell;
    use heapless::Vec;

    use crate::config::radio_link::MAX_PAYLOAD;

    /// Mock radio for unit testing
    pub struct MockRadio {
        /// Record of transmitted payloads
        tx_history: RefCell<Vec<Vec<u8, MAX_PAYLOAD>, 8>>,
        /// Current configuration
        config: RefCell<Option<RadioConfig>>,
        /// Current writing pipe address
        pipe: RefCell<Option<[u8; 5]>>,
        /// Number of upcoming write() calls that should fail
        failing_writes: RefCell<u8>,
        /// Error returned while writes are failing
        write_error: RefCell<RadioError>,
        /// Error to return from init()
        init_error: RefCell<Option<RadioError>>,
        /// Whether init has been called
        initialised: RefCell<bool>,
        /// Total write() calls, successful or not
        write_attempts: RefCell<u32>,
    }

    impl MockRadio {
        /// Create a new mock radio
        pub fn new() -> Self {
            Self {
                tx_history: RefCell::new(Vec::new()),
                config: RefCell::new(None),
                pipe: RefCell::new(None),
                failing_writes: RefCell::new(0),
                write_error: RefCell::new(RadioError::NoAck),
                init_error: RefCell::new(None),
                initialised: RefCell::new(false),
                write_attempts: RefCell::new(0),
            }
        }

        /// Make the next `count` write() calls fail with `error`
        pub fn fail_writes(&self, count: u8, error: RadioError) {
            *self.failing_writes.borrow_mut() = count;
            *self.write_error.borrow_mut() = error;
        }

        /// Make init() fail with `error`
        pub fn fail_init(&self, error: RadioError) {
            *self.init_error.borrow_mut() = Some(error);
        }

        /// Get all successfully transmitted payloads
        pub fn get_tx_history(&self) -> Vec<Vec<u8, MAX_PAYLOAD>, 8> {
            self.tx_history.borrow().clone()
        }

        /// Total write() calls made, including failed ones
        pub fn attempts(&self) -> u32 {
            *self.write_attempts.borrow()
        }

        /// Check if the radio has been initialised
        pub fn is_initialised(&self) -> bool {
            *self.initialised.borrow()
        }

        /// Get the current configuration
        pub fn get_config(&self) -> Option<RadioConfig> {
            self.config.borrow().clone()
        }

        /// Get the current writing pipe address
        pub fn get_pipe(&self) -> Option<[u8; 5]> {
            *self.pipe.borrow()
        }
    }

    impl Default for MockRadio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Radio for MockRadio {
        async fn init(&mut self) -> Result<(), RadioError> {
            if let Some(error) = self.init_error.borrow_mut().take() {
                return Err(error);
            }
            *self.initialised.borrow_mut() = true;
            Ok(())
        }

        async fn configure(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
            *self.config.borrow_mut() = Some(config.clone());
            Ok(())
        }

        async fn open_writing_pipe(&mut self, address: &[u8; 5]) -> Result<(), RadioError> {
            *self.pipe.borrow_mut() = Some(*address);
            Ok(())
        }

        async fn write(&mut self, payload: &[u8]) -> Result<(), RadioError> {
            *self.write_attempts.borrow_mut() += 1;

            let mut failing = self.failing_writes.borrow_mut();
            if *failing > 0 {
                *failing -= 1;
                return Err(*self.write_error.borrow());
            }

            let mut packet = Vec::new();
            packet
                .extend_from_slice(payload)
                .map_err(|_| RadioError::TxFifoFull)?;
            let _ = self.tx_history.borrow_mut().push(packet);

            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_write_records_payload() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                radio.init().await.unwrap();

                let data = [0x01, 0x02, 0x03];
                radio.write(&data).await.unwrap();

                let history = radio.get_tx_history();
                assert_eq!(history.len(), 1);
                assert_eq!(history[0].as_slice(), &data);
                assert_eq!(radio.attempts(), 1);
            });
        }

        #[test]
        fn test_mock_fail_writes_then_recover() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                radio.fail_writes(2, RadioError::NoAck);

                assert_eq!(radio.write(&[0x01]).await, Err(RadioError::NoAck));
                assert_eq!(radio.write(&[0x01]).await, Err(RadioError::NoAck));
                radio.write(&[0x01]).await.unwrap();

                assert_eq!(radio.attempts(), 3);
                assert_eq!(radio.get_tx_history().len(), 1);
            });
        }

        #[test]
        fn test_mock_records_configuration() {
            let mut radio = MockRadio::new();

            futures::executor::block_on(async {
                let config = RadioConfig::default();
                radio.configure(&config).await.unwrap();
                radio.open_writing_pipe(b"00001").await.unwrap();

                assert_eq!(radio.get_config(), Some(config));
                assert_eq!(radio.get_pipe(), Some(*b"00001"));
            });
        }
    }
}

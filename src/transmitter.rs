//! Packet transmission with an explicit retry policy
//!
//! Two policies exist across the system's revisions and are deliberately
//! not conflated:
//!
//! - [`TxPolicy::AcknowledgedRetry`]: hardware auto-ACK on, up to a fixed
//!   number of attempts with a short pause between them. Higher delivery
//!   confidence, more airtime and power.
//! - [`TxPolicy::FireAndForget`]: auto-ACK and hardware retransmit disabled
//!   at configuration time, one write per cycle. The result only reflects
//!   whether the radio accepted the payload, not delivery.
//!
//! The shipped default is fire-and-forget (see [`crate::node`]); either
//! way a failed cycle's packet is dropped, never queued for later.

use embedded_hal_async::delay::DelayNs;

use crate::config::{radio_link, retry};
use crate::packet::WirePacket;
use crate::radio::{Radio, RadioConfig, RadioError};

/// Transmit retry policy, chosen once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPolicy {
    /// Single attempt per cycle, hardware ACK machinery disabled
    FireAndForget,
    /// Up to `attempts` tries with `retry_delay_ms` between them
    AcknowledgedRetry { attempts: u8, retry_delay_ms: u32 },
}

impl TxPolicy {
    /// The acknowledged policy with the configured retry constants.
    pub const fn acknowledged() -> Self {
        TxPolicy::AcknowledgedRetry {
            attempts: retry::ATTEMPTS,
            retry_delay_ms: retry::DELAY_MS,
        }
    }

    /// Radio configuration matching this policy.
    pub fn radio_config(&self) -> RadioConfig {
        RadioConfig {
            auto_ack: matches!(self, TxPolicy::AcknowledgedRetry { .. }),
            ..RadioConfig::default()
        }
    }
}

/// Owns the radio for the node's lifetime and drives it per policy.
pub struct Transmitter<R, D> {
    pub(crate) radio: R,
    delay: D,
    policy: TxPolicy,
}

impl<R, D> Transmitter<R, D>
where
    R: Radio,
    D: DelayNs,
{
    pub fn new(radio: R, delay: D, policy: TxPolicy) -> Self {
        Self {
            radio,
            delay,
            policy,
        }
    }

    /// Bring up and configure the radio. Failure here is fatal for the node.
    pub async fn init(&mut self) -> Result<(), RadioError> {
        self.radio.init().await?;
        self.radio.configure(&self.policy.radio_config()).await?;
        self.radio
            .open_writing_pipe(&radio_link::PIPE_ADDRESS)
            .await
    }

    /// Send one packet per the configured policy.
    ///
    /// Returns whether the radio layer reported success; the packet is gone
    /// either way.
    pub async fn send(&mut self, packet: &WirePacket) -> bool {
        match self.policy {
            TxPolicy::FireAndForget => match self.radio.write(packet).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("transmit failed: {:?}", e);
                    false
                }
            },
            TxPolicy::AcknowledgedRetry {
                attempts,
                retry_delay_ms,
            } => {
                for attempt in 1..=attempts {
                    match self.radio.write(packet).await {
                        Ok(()) => return true,
                        Err(e) => {
                            log::warn!("transmit attempt {}/{} failed: {:?}", attempt, attempts, e);
                            if attempt < attempts {
                                self.delay.delay_ms(retry_delay_ms).await;
                            }
                        }
                    }
                }
                false
            }
        }
    }

    /// The policy in force.
    pub fn policy(&self) -> TxPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::traits::mock::MockRadio;
    use crate::status::mock::InstantDelay;

    fn packet() -> WirePacket {
        let mut p = [0u8; 16];
        p[0] = 0xAB;
        p
    }

    #[test]
    fn test_policy_selects_auto_ack() {
        assert!(!TxPolicy::FireAndForget.radio_config().auto_ack);
        assert!(TxPolicy::acknowledged().radio_config().auto_ack);
    }

    #[test]
    fn test_init_applies_config_and_pipe() {
        let delay = InstantDelay::default();
        let mut tx = Transmitter::new(MockRadio::new(), &delay, TxPolicy::FireAndForget);

        futures::executor::block_on(async {
            tx.init().await.unwrap();
        });

        assert!(tx.radio.is_initialised());
        let config = tx.radio.get_config().unwrap();
        assert!(!config.auto_ack);
        assert_eq!(config.channel, radio_link::CHANNEL);
        assert_eq!(tx.radio.get_pipe(), Some(radio_link::PIPE_ADDRESS));
    }

    #[test]
    fn test_retry_succeeds_on_third_attempt() {
        let delay = InstantDelay::default();
        let mut tx = Transmitter::new(
            MockRadio::new(),
            &delay,
            TxPolicy::AcknowledgedRetry {
                attempts: 3,
                retry_delay_ms: 50,
            },
        );

        futures::executor::block_on(async {
            tx.init().await.unwrap();
            tx.radio.fail_writes(2, RadioError::NoAck);

            assert!(tx.send(&packet()).await);
        });

        assert_eq!(tx.radio.attempts(), 3);
        assert_eq!(tx.radio.get_tx_history().len(), 1);
        // One delay between each failed attempt and the next, none after
        // the success.
        assert_eq!(delay.requested_ms.borrow().as_slice(), &[50, 50]);
    }

    #[test]
    fn test_retry_exhaustion_reports_failure() {
        let delay = InstantDelay::default();
        let mut tx = Transmitter::new(
            MockRadio::new(),
            &delay,
            TxPolicy::AcknowledgedRetry {
                attempts: 3,
                retry_delay_ms: 50,
            },
        );

        futures::executor::block_on(async {
            tx.init().await.unwrap();
            tx.radio.fail_writes(3, RadioError::NoAck);

            assert!(!tx.send(&packet()).await);
        });

        assert_eq!(tx.radio.attempts(), 3);
        assert!(tx.radio.get_tx_history().is_empty());
    }

    #[test]
    fn test_fire_and_forget_makes_one_attempt() {
        let delay = InstantDelay::default();
        let mut tx = Transmitter::new(MockRadio::new(), &delay, TxPolicy::FireAndForget);

        futures::executor::block_on(async {
            tx.init().await.unwrap();
            tx.radio.fail_writes(1, RadioError::TxFifoFull);

            assert!(!tx.send(&packet()).await);
            // Next cycle is independent and succeeds.
            assert!(tx.send(&packet()).await);
        });

        assert_eq!(tx.radio.attempts(), 2);
        assert!(delay.requested_ms.borrow().is_empty());
    }
}

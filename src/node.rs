//! Node control loop
//!
//! [`Node`] is the single context object owning every component: sensor
//! acquisition, transmitter, status LED, and the scheduler. The main binary
//! does nothing but construct it and call [`Node::poll`] with the current
//! scaled tick, so the whole cycle logic runs against mocks on the host.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::clock::ClockScale;
use crate::config::intervals;
use crate::packet::SensorReading;
use crate::radio::{Radio, RadioError};
use crate::sensors::{AngleSensor, EnvironmentSensor, SensorAcquisition, WindAnemometer};
use crate::status::{StatusLed, StatusPattern};
use crate::timing::{IntervalTimer, Scheduler, SchedulerEvent};
use crate::transmitter::Transmitter;

/// Scheduler and heartbeat intervals, already divided by the clock scale.
#[derive(Debug, Clone, Copy)]
pub struct NodeTiming {
    pub transmission_ms: u32,
    pub status_log_ms: u32,
    pub heartbeat_ms: u32,
    /// Kept so log output can report real-world time
    pub scale: ClockScale,
}

impl NodeTiming {
    /// The configured base intervals under the given clock scale.
    pub fn from_scale(scale: ClockScale) -> Self {
        Self {
            transmission_ms: scale.scaled_interval(intervals::TRANSMISSION_BASE_MS),
            status_log_ms: scale.scaled_interval(intervals::STATUS_LOG_BASE_MS),
            heartbeat_ms: scale.scaled_interval(intervals::HEARTBEAT_BASE_MS),
            scale,
        }
    }
}

/// The full telemetry node
pub struct Node<E, A, W, R, DT, P, DL> {
    sensors: SensorAcquisition<E, A, W>,
    transmitter: Transmitter<R, DT>,
    led: StatusLed<P, DL>,
    scheduler: Scheduler,
    heartbeat: IntervalTimer,
    scale: ClockScale,
    cycles_sent: u32,
    cycles_failed: u32,
}

impl<E, A, W, R, DT, P, DL> Node<E, A, W, R, DT, P, DL>
where
    E: EnvironmentSensor,
    A: AngleSensor,
    W: WindAnemometer,
    R: Radio,
    DT: DelayNs,
    P: OutputPin,
    DL: DelayNs,
{
    pub fn new(
        sensors: SensorAcquisition<E, A, W>,
        transmitter: Transmitter<R, DT>,
        led: StatusLed<P, DL>,
        timing: NodeTiming,
    ) -> Self {
        Self {
            sensors,
            transmitter,
            led,
            scheduler: Scheduler::new(timing.transmission_ms, timing.status_log_ms),
            heartbeat: IntervalTimer::new(timing.heartbeat_ms),
            scale: timing.scale,
            cycles_sent: 0,
            cycles_failed: 0,
        }
    }

    /// One-time startup: probe sensors, then bring up the radio.
    ///
    /// A sensor failure degrades the node (sentinel values forever after)
    /// but does not stop it. A radio failure is fatal; the caller must not
    /// poll and should loop the failure pattern instead.
    pub async fn init(&mut self) -> Result<(), RadioError> {
        let status = self.sensors.init().await;
        if !status.all_ok() {
            log::warn!(
                "running degraded: environment={} wind_vane={}",
                status.environment,
                status.wind_vane
            );
            self.led.signal(StatusPattern::SensorInitFailure).await;
        }

        if let Err(e) = self.transmitter.init().await {
            log::error!("radio init failed: {:?}", e);
            return Err(e);
        }

        log::info!(
            "node up, policy {:?}, clock scale /{}",
            self.transmitter.policy(),
            self.scale.factor()
        );
        self.led.signal(StatusPattern::InitSuccess).await;
        Ok(())
    }

    /// Loop forever on the fatal radio-init pattern. Never returns.
    pub async fn halt(&mut self) -> ! {
        loop {
            self.led.signal(StatusPattern::RadioInitFailure).await;
        }
    }

    /// Drive one scheduler tick. Never blocks beyond the bounded bus
    /// transactions and LED patterns of whatever fired.
    pub async fn poll(&mut self, now_ms: u32) {
        match self.scheduler.poll(now_ms) {
            SchedulerEvent::Transmit => {
                let reading = self.sensors.read_all().await;
                self.transmit_cycle(&reading).await;
            }
            SchedulerEvent::StatusLog { next_transmit_ms } => {
                // Scheduler ticks are in scaled counter time; report wall
                // clock in the log.
                let real_ms = next_transmit_ms.saturating_mul(self.scale.factor());
                log::info!(
                    "alive: {} sent, {} failed, next transmission in {} s",
                    self.cycles_sent,
                    self.cycles_failed,
                    real_ms / 1_000
                );
            }
            SchedulerEvent::Idle => {
                // Heartbeat only when nothing else fired this poll.
                if self.heartbeat.expired(now_ms) {
                    self.heartbeat.reset(now_ms);
                    self.led.signal(StatusPattern::IdleHeartbeat).await;
                }
            }
        }
    }

    async fn transmit_cycle(&mut self, reading: &SensorReading) {
        let packet = reading.encode();

        if self.transmitter.send(&packet).await {
            self.cycles_sent += 1;
            log::info!(
                "sent: {} cC, {} Pa, {} %, {} deg, {} ckm/h",
                reading.temperature_centi_c,
                reading.pressure_pa,
                reading.humidity_pct,
                reading.wind_direction_deg,
                reading.wind_speed_centi_kmh
            );
            self.led.signal(StatusPattern::TransmitSuccess).await;
        } else {
            self.cycles_failed += 1;
            log::warn!("cycle dropped, next in one interval");
            self.led.signal(StatusPattern::TransmitFailure).await;
        }
    }
}

#![no_std]
#![no_main]

// Required for ESP-IDF bootloader compatibility
// Use explicit parameters to ensure correct efuse block revision values
esp_bootloader_esp_idf::esp_app_desc!(
    env!("CARGO_PKG_VERSION"),  // version
    env!("CARGO_PKG_NAME"),     // project_name
    "00:00:00",                 // build_time
    "2025-01-01",               // build_date
    "0.0.0",                    // idf_ver (not using IDF)
    0x10000,                    // mmu_page_size (64KB)
    0,                          // min_efuse_blk_rev_full (accept all)
    u16::MAX                    // max_efuse_blk_rev_full (accept all)
);

use embassy_time::Delay;
use esp_backtrace as _;
use esp_hal::analog::adc::{Adc, AdcConfig, Attenuation};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode as SpiMode;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::Async;
use static_cell::StaticCell;

use weather_node_firmware::clock::{ClockScale, ScaledTicks, ACTIVE_SCALE};
use weather_node_firmware::config::intervals;
use weather_node_firmware::node::{Node, NodeTiming};
use weather_node_firmware::radio::nrf24::{Nrf24Driver, Nrf24Pins};
use weather_node_firmware::sensors::as5600::As5600;
use weather_node_firmware::sensors::bme280::Bme280;
use weather_node_firmware::sensors::wind::WindAdc;
use weather_node_firmware::sensors::SensorAcquisition;
use weather_node_firmware::status::StatusLed;
use weather_node_firmware::transmitter::{Transmitter, TxPolicy};

/// Retry policy shipped on this hardware.
///
/// Fire-and-forget: hardware ACK machinery disabled, one write per cycle.
/// Lowest airtime and power draw; a lost packet is simply absent from the
/// receiver's feed until the next interval.
const TX_POLICY: TxPolicy = TxPolicy::FireAndForget;

type EnvSensor = Bme280<I2c<'static, Async>>;
type WindVane = As5600<I2c<'static, Async>>;
type RadioDriver = Nrf24Driver<Spi<'static, Async>, Output<'static>, Output<'static>>;

type WeatherNode = Node<
    EnvSensor,
    WindVane,
    WindAdc<'static>,
    RadioDriver,
    Delay,
    Output<'static>,
    Delay,
>;

/// Static executor for embassy
static EXECUTOR: StaticCell<esp_rtos::embassy::Executor> = StaticCell::new();

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();

    // Run the core slow for battery life. The logical tick scale applied to
    // all intervals is ACTIVE_SCALE; see the clock module.
    let cpu_clock = match ACTIVE_SCALE {
        ClockScale::Full => CpuClock::_240MHz,
        ClockScale::Div8 => CpuClock::_80MHz,
    };
    let peripherals = esp_hal::init(esp_hal::Config::default().with_cpu_clock(cpu_clock));

    // Status LED, active low: start off
    let led = Output::new(peripherals.GPIO48, Level::High, OutputConfig::default());

    // Initialise the RTOS scheduler with timer - MUST be done before any async operations
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // SPI for the NRF24L01
    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(4))
            .with_mode(SpiMode::_0),
    )
    .unwrap()
    .with_sck(peripherals.GPIO7)
    .with_miso(peripherals.GPIO8)
    .with_mosi(peripherals.GPIO9)
    .into_async();

    let ce = Output::new(peripherals.GPIO41, Level::Low, OutputConfig::default());
    let csn = Output::new(peripherals.GPIO40, Level::High, OutputConfig::default());
    let radio = Nrf24Driver::new(spi, Nrf24Pins { ce, csn });

    // Environment sensor bus
    let env_i2c = I2c::new(peripherals.I2C0, I2cConfig::default())
        .unwrap()
        .with_sda(peripherals.GPIO4)
        .with_scl(peripherals.GPIO5)
        .into_async();
    let environment = Bme280::new(env_i2c);

    // Wind vane bus
    let vane_i2c = I2c::new(peripherals.I2C1, I2cConfig::default())
        .unwrap()
        .with_sda(peripherals.GPIO16)
        .with_scl(peripherals.GPIO17)
        .into_async();
    let wind_vane = As5600::new(vane_i2c);

    // Anemometer analog input
    let mut adc_config = AdcConfig::new();
    let wind_pin = adc_config.enable_pin(peripherals.GPIO1, Attenuation::_11dB);
    let anemometer = WindAdc::new(Adc::new(peripherals.ADC1, adc_config), wind_pin);

    let sensors = SensorAcquisition::new(environment, wind_vane, anemometer);
    let transmitter = Transmitter::new(radio, Delay, TX_POLICY);
    let status_led = StatusLed::new(led, Delay);

    let node = Node::new(
        sensors,
        transmitter,
        status_led,
        NodeTiming::from_scale(ACTIVE_SCALE),
    );

    // Create and run the embassy executor
    let executor = EXECUTOR.init(esp_rtos::embassy::Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(node_task(node));
    })
}

/// The node's single cooperative loop: poll, short pause, repeat.
#[embassy_executor::task]
async fn node_task(mut node: WeatherNode) {
    let ticks = ScaledTicks::new(ACTIVE_SCALE);

    // Let the supply rails and peripherals settle before probing
    embassy_time::Timer::after_millis(intervals::BOOT_SETTLE_MS as u64).await;

    if node.init().await.is_err() {
        // Radio is unusable; nothing to transmit with, ever.
        node.halt().await;
    }

    loop {
        node.poll(ticks.now_ms()).await;
        embassy_time::Timer::after_millis(intervals::LOOP_PAUSE_MS as u64).await;
    }
}

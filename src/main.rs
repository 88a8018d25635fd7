//! Growatt Bridge Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter   MqttAdapter   GrowattInverter   StatusLeds      │
//! │  (LinkPort)    (SessionPort) (InverterPort)    (IndicatorPort) │
//! │  SystemClock   StatusMirror  LogEventSink                      │
//! │  (ClockPort)   (HttpPort)    (EventSink)                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           BridgeService (cooperative loop)             │    │
//! │  │  LinkSupervisor · SessionSupervisor · timers · payload │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::info;

use growatt_bridge::adapters::http_server::{StatusMirror, start_server};
use growatt_bridge::adapters::log_sink::LogEventSink;
use growatt_bridge::adapters::mqtt::MqttAdapter;
use growatt_bridge::adapters::time::SystemClock;
use growatt_bridge::adapters::wifi::WifiAdapter;
use growatt_bridge::app::ports::ClockPort;
use growatt_bridge::app::service::{BridgeIo, BridgeService};
use growatt_bridge::config::BridgeConfig;
use growatt_bridge::drivers::status_led::StatusLeds;
use growatt_bridge::error::Error;
use growatt_bridge::{pins, update};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Growatt bridge v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    update::check_rollback();

    // ── 2. Configuration ──────────────────────────────────────
    let config = BridgeConfig::default();
    config.validate().map_err(Error::from)?;
    info!(
        "Config: ssid='{}' broker={}:{} topic='{}' hostname='{}'",
        config.wifi_ssid, config.mqtt_host, config.mqtt_port, config.mqtt_topic, config.hostname
    );

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. Status LEDs ────────────────────────────────────────
    // SAFETY: each GPIO number is claimed exactly once, here.
    let (alive, link, error) = unsafe {
        (
            AnyOutputPin::new(pins::LED_ALIVE_GPIO),
            AnyOutputPin::new(pins::LED_LINK_GPIO),
            AnyOutputPin::new(pins::LED_ERROR_GPIO),
        )
    };
    let leds = StatusLeds::new(
        PinDriver::output(alive)?,
        PinDriver::output(link)?,
        PinDriver::output(error)?,
    );

    // ── 4. Inverter link ──────────────────────────────────────
    #[cfg(feature = "simulate")]
    let inverter = {
        info!("Inverter: simulated");
        growatt_bridge::adapters::inverter::SimulatedInverter::new()
    };

    #[cfg(not(feature = "simulate"))]
    let inverter = {
        use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
        use esp_idf_hal::units::Hertz;

        // SAFETY: the UART pins are not used anywhere else.
        let (tx, rx) = unsafe {
            (
                AnyIOPin::new(pins::INVERTER_UART_TX_GPIO),
                AnyIOPin::new(pins::INVERTER_UART_RX_GPIO),
            )
        };
        let uart_cfg = UartConfig::new().baudrate(Hertz(config.inverter_baud));
        let uart = UartDriver::new(
            peripherals.uart1,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_cfg,
        )?;
        info!("Inverter: UART1 at {} baud, slave {}", config.inverter_baud, config.inverter_address);
        growatt_bridge::adapters::inverter::GrowattInverter::begin(uart, config.inverter_address)
    };

    // ── 5. Network adapters ───────────────────────────────────
    let wifi = WifiAdapter::new(peripherals.modem, sys_loop, nvs, &config.hostname)?;
    let mirror = StatusMirror::new(&config.update_path);
    let _server = start_server(&mirror, &config)?;

    let mut io = BridgeIo {
        link: wifi,
        session: MqttAdapter::new(),
        inverter,
        leds,
        clock: SystemClock::new(),
        http: mirror,
    };
    let mut sink = LogEventSink::new();

    // ── 6. Scheduling loop ────────────────────────────────────
    let mut service = BridgeService::new(&config);
    service.start(&mut io, &mut sink);

    loop {
        service.tick(&mut io, &mut sink);
        io.clock.delay_ms(config.loop_idle_ms);
    }
}

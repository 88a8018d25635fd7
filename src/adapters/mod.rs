//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements    | Connects to                      |
//! |---------------|---------------|----------------------------------|
//! | `wifi`        | LinkPort      | ESP-IDF WiFi STA                 |
//! | `mqtt`        | SessionPort   | ESP-IDF MQTT client              |
//! | `inverter`    | InverterPort  | Modbus-RTU on UART / simulator   |
//! | `http_server` | HttpPort      | ESP-IDF httpd                    |
//! | `time`        | ClockPort     | ESP32 system timer               |
//! | `log_sink`    | EventSink     | Serial log output                |
//!
//! Status LEDs implement `IndicatorPort` in [`crate::drivers::status_led`].

pub mod http_server;
pub mod inverter;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub(crate) mod utils;
pub mod wifi;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `hardware` | VoltagePort    | ESP32 ADC1                  |
//! |            | IndicatorPort  | Status lamp GPIOs           |
//! |            | TonePort       | DAC cosine generator        |
//! | `log_sink` | EventSink      | Serial log output           |
//! | `nvs`      | ConfigPort     | NVS / in-memory store       |
//! |            | StoragePort    |                             |
//! | `telegram` | MessagePort    | Telegram Bot API over HTTPS |
//! | `time`     | ClockPort      | ESP32 system timer, SNTP    |
//! | `wifi`     |                | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod telegram;
pub mod time;
pub mod wifi;

//! Three-lamp status indicator.
//!
//! Discrete error (red), warn (yellow) and ok (green) LEDs on plain GPIO
//! outputs, active HIGH.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIOs via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct StatusLamps {
    current: (bool, bool, bool),
}

impl Default for StatusLamps {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLamps {
    pub fn new() -> Self {
        Self {
            current: (false, false, false),
        }
    }

    pub fn set(&mut self, error: bool, warn: bool, ok: bool) {
        hw_init::gpio_write(pins::ERROR_LED_GPIO, error);
        hw_init::gpio_write(pins::WARN_LED_GPIO, warn);
        hw_init::gpio_write(pins::OK_LED_GPIO, ok);
        self.current = (error, warn, ok);
    }

    /// `(error, warn, ok)` as last written.
    pub fn current(&self) -> (bool, bool, bool) {
        self.current
    }
}

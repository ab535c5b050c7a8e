//! Sensor drivers.
//!
//! The line alarm has a single analog input; see [`line_voltage`].

pub mod line_voltage;

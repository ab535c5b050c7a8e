//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the line alarm: the
//! control tick, the bot command vocabulary, and the interpreter that
//! maintains the identity sets.  All interaction with hardware and the
//! network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod interpreter;
pub mod ports;
pub mod service;

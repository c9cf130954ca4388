//! Application core: the control thread's view of the system.
//!
//! Converts averaged tachometer readings into actuator commands and
//! reports what it did.  All interaction with hardware goes through the
//! [`ports`] traits, so everything here runs unchanged on the host.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod task;

//! Closed-loop DC motor speed controller.
//!
//! Exposes the pure-logic modules and the `embedded-hal` generic drivers
//! for integration testing and for board crates to wire up.
//!
//! ```text
//!  ADC wiring ─▶ Acquisition (ISR) ─▶ Accumulator ─▶ SampleQueue ─▶ control_task
//!                                                                  │
//!                            ActuatorPort ◀── ControlService ◀─────┘
//! ```

#![deny(unused_must_use)]

pub mod acquisition;
pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod queue;
pub mod sensors;
#[cfg(not(target_os = "none"))]
pub mod sim;

pub use error::{Error, Result};

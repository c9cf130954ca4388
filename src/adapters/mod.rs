//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | ActuatorPort | `embedded-hal` PWM + two GPIOs |
//! | `log_sink` | EventSink    | `log` facade                   |

pub mod hardware;
pub mod log_sink;

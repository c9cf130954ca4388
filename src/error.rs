//! Unified error types for the motor controller.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! control task handles failures uniformly.  All variants are `Copy` so
//! they can be returned from interrupt handlers without allocation.
//!
//! None of these are fatal: acquisition errors are counted and the
//! cadence continues, actuator errors leave the previous duty in place.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The ADC conversion or bus read failed.
    Acquisition(AcquisitionError),
    /// The sample queue refused a value.
    Queue(QueueError),
    /// An actuator command failed or violated its precondition.
    Actuator(ActuatorError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition(e) => write!(f, "acquisition: {e}"),
            Self::Queue(e) => write!(f, "queue: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Acquisition errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The busy line never released within the configured timeout.
    ConversionTimeout,
    /// A data or busy line could not be read.
    BusReadFailed,
    /// The R/C or BYTE control line could not be driven.
    ControlLineFailed,
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConversionTimeout => write!(f, "conversion timed out"),
            Self::BusReadFailed => write!(f, "bus read failed"),
            Self::ControlLineFailed => write!(f, "control line write failed"),
        }
    }
}

impl From<AcquisitionError> for Error {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

// ---------------------------------------------------------------------------
// Queue errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Buffer already holds `capacity` items; the value was dropped.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "queue full, value dropped"),
        }
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Self::Queue(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Requested duty exceeds the PWM period.  The actuator never clamps.
    DutyOutOfRange,
    /// PWM compare write failed.
    PwmWriteFailed,
    /// Direction GPIO write failed.
    DirectionWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DutyOutOfRange => write!(f, "duty out of range"),
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::DirectionWriteFailed => write!(f, "direction write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

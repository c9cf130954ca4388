//! Inbound commands to the control service.
//!
//! These come from the operator side (keypad decoder, serial console,
//! host simulation) and are interpreted by
//! [`ControlService::handle_command`](super::service::ControlService::handle_command).

use crate::config::ControllerConfig;
use crate::control::StrategyKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// New target speed in RPM.
    SetTarget(u16),

    /// Switch control law; the new one starts with no history.
    SelectStrategy(StrategyKind),

    /// Target to zero and the motor off immediately.
    Stop,

    /// Hot-reload tuning.  Rejected unless it validates and leaves the
    /// acquisition fields untouched.
    UpdateConfig(ControllerConfig),
}

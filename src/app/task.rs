//! Async control thread body.
//!
//! ```text
//!  WindowedSink (ISR) ──put──▶ averages ──get().await──▶ control_step
//!  keypad decoder     ──put──▶ targets  ──try_get()───▶      │
//!                                                            ▼
//!                                              ControlService::update
//! ```
//!
//! `averages.get()` is the only suspension point: the task sleeps until
//! the acquisition side completes a window.

use log::warn;

use crate::error::Result;
use crate::queue::SampleQueue;

use super::commands::ControlCommand;
use super::ports::{ActuatorPort, EventSink};
use super::service::ControlService;

/// Await one window average, apply pending targets, run one iteration.
pub async fn control_step<const N: usize, const M: usize>(
    service: &mut ControlService,
    averages: &SampleQueue<i32, N>,
    targets: &SampleQueue<u16, M>,
    hw: &mut impl ActuatorPort,
    sink: &mut impl EventSink,
) -> Result<u16> {
    let millivolts = averages.get().await;

    while let Some(target) = targets.try_get() {
        service.handle_command(ControlCommand::SetTarget(target), hw, sink)?;
    }
    service.note_lost(averages.lost_count(), sink);

    service.update(millivolts, hw, sink)
}

/// Run the control loop forever.  Errors are logged and the loop goes on.
pub async fn control_task<const N: usize, const M: usize>(
    service: &mut ControlService,
    averages: &SampleQueue<i32, N>,
    targets: &SampleQueue<u16, M>,
    hw: &mut impl ActuatorPort,
    sink: &mut impl EventSink,
) {
    loop {
        if let Err(e) = control_step(service, averages, targets, hw, sink).await {
            warn!("control iteration failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::NullSink;
    use crate::config::ControllerConfig;
    use crate::error::ActuatorError;
    use futures_lite::future::block_on;

    struct Duty(u16);

    impl ActuatorPort for Duty {
        fn set_duty_cycle(&mut self, n: u16, _period: u16) -> core::result::Result<(), ActuatorError> {
            self.0 = n;
            Ok(())
        }

        fn set_direction(&mut self, _forward: bool) -> core::result::Result<(), ActuatorError> {
            Ok(())
        }
    }

    #[test]
    fn step_drains_targets_before_update() {
        let mut svc = ControlService::new(ControllerConfig::default()).unwrap();
        let averages: SampleQueue<i32, 4> = SampleQueue::new();
        let targets: SampleQueue<u16, 4> = SampleQueue::new();
        let mut hw = Duty(0);

        targets.put(1000).unwrap();
        targets.put(2400).unwrap();
        averages.put(0).unwrap();

        let n = block_on(control_step(&mut svc, &averages, &targets, &mut hw, &mut NullSink)).unwrap();
        assert_eq!(n, 2300);
        assert_eq!(hw.0, 2300);
        assert!(targets.is_empty());
    }
}

//! ControlService and control_step against recording mocks.

use futures_lite::future::block_on;
use motorctl::app::commands::ControlCommand;
use motorctl::app::events::AppEvent;
use motorctl::app::service::ControlService;
use motorctl::app::task::control_step;
use motorctl::config::ControllerConfig;
use motorctl::control::StrategyKind;
use motorctl::queue::SampleQueue;

use crate::mock_hw::{ActuatorCall, MockActuator, RecordingSink};

fn started(config: ControllerConfig) -> (ControlService, MockActuator, RecordingSink) {
    let mut svc = ControlService::new(config).unwrap();
    let mut hw = MockActuator::new();
    let mut sink = RecordingSink::default();
    svc.start(&mut hw, &mut sink).unwrap();
    (svc, hw, sink)
}

#[test]
fn start_sets_direction_before_duty() {
    let (_, hw, _) = started(ControllerConfig::default());
    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::Direction { forward: true },
            ActuatorCall::Duty { n: 0, period: 2500 },
        ]
    );
}

#[test]
fn every_command_stays_within_period() {
    let (mut svc, mut hw, mut sink) = started(ControllerConfig::default());
    svc.handle_command(ControlCommand::SetTarget(u16::MAX), &mut hw, &mut sink)
        .unwrap();
    for mv in [-10_000, 0, 499, 500, 5_000, 10_000] {
        svc.update(mv, &mut hw, &mut sink).unwrap();
    }
    svc.handle_command(ControlCommand::SelectStrategy(StrategyKind::Fuzzy), &mut hw, &mut sink)
        .unwrap();
    for _ in 0..50 {
        svc.update(0, &mut hw, &mut sink).unwrap();
    }
    assert!(hw.calls.iter().all(|c| match c {
        ActuatorCall::Duty { n, period } => n <= period,
        ActuatorCall::Direction { .. } => true,
    }));
    assert_eq!(hw.last_duty(), Some(2500));
}

#[test]
fn keypad_targets_are_applied_in_order() {
    let (mut svc, mut hw, mut sink) = started(ControllerConfig::default());
    let averages: SampleQueue<i32, 4> = SampleQueue::new();
    let targets: SampleQueue<u16, 4> = SampleQueue::new();

    for t in [1000, 2000, 2400] {
        targets.put(t).unwrap();
    }
    averages.put(0).unwrap();
    block_on(control_step(&mut svc, &averages, &targets, &mut hw, &mut sink)).unwrap();

    let changes: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::TargetChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(changes, vec![1000, 2000, 2400]);
    assert_eq!(svc.telemetry().target, 2400);
    assert_eq!(hw.last_duty(), Some(2300));
}

#[test]
fn lost_windows_surface_as_event() {
    let (mut svc, mut hw, mut sink) = started(ControllerConfig::default());
    let averages: SampleQueue<i32, 1> = SampleQueue::new();
    let targets: SampleQueue<u16, 4> = SampleQueue::new();

    averages.put(0).unwrap();
    assert!(averages.put(1).is_err());
    block_on(control_step(&mut svc, &averages, &targets, &mut hw, &mut sink)).unwrap();

    assert!(
        sink.events
            .contains(&AppEvent::SamplesLost { new: 1, total: 1 })
    );
}

#[test]
fn stop_overrides_running_loop() {
    let (mut svc, mut hw, mut sink) = started(ControllerConfig::default());
    svc.handle_command(ControlCommand::SetTarget(3000), &mut hw, &mut sink)
        .unwrap();
    svc.update(2_000, &mut hw, &mut sink).unwrap();
    assert!(hw.last_duty().unwrap() > 0);

    svc.handle_command(ControlCommand::Stop, &mut hw, &mut sink).unwrap();
    assert_eq!(hw.last_duty(), Some(0));
    assert_eq!(svc.update(2_000, &mut hw, &mut sink).unwrap(), 0);
}

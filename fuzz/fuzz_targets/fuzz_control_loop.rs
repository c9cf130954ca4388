//! Fuzz target: `ControlLoop::update`
//!
//! Interprets the input as a stream of (target, measured, strategy) triples
//! and checks that the command never leaves `[0, PWM_PERIOD]` and that a
//! zero target always yields zero.
//!
//! cargo fuzz run fuzz_control_loop

#![no_main]

use libfuzzer_sys::fuzz_target;
use motorctl::config::ControllerConfig;
use motorctl::control::{ControlLoop, StrategyKind};

fuzz_target!(|data: &[u8]| {
    let Some((&period_byte, rest)) = data.split_first() else {
        return;
    };
    let config = ControllerConfig {
        pwm_period: u16::from(period_byte).max(1) * 40,
        ..ControllerConfig::default()
    };
    let mut control = ControlLoop::new(&config);

    for chunk in rest.chunks_exact(5) {
        let target = u16::from_le_bytes([chunk[0], chunk[1]]);
        let measured = u16::from_le_bytes([chunk[2], chunk[3]]);
        if chunk[4] & 0x80 != 0 {
            let kind = if chunk[4] & 1 == 0 {
                StrategyKind::Fuzzy
            } else {
                StrategyKind::Pid
            };
            control.select(kind, &config);
        }

        control.set_target(target);
        let n = control.update(measured);
        assert!(n <= config.pwm_period, "command {n} above period");
        if target == 0 {
            assert_eq!(n, 0, "zero target must stop");
        }
    }
});

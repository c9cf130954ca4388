//! Acquisition state machine against the pin-level ADC model.

use embedded_hal::delay::DelayNs;
use motorctl::acquisition::isr_cell::IsrCell;
use motorctl::acquisition::{Acquisition, AcquisitionState, PendingIrqs, TriggerMode};
use motorctl::config::ControllerConfig;
use motorctl::error::{AcquisitionError, Error};
use motorctl::queue::SampleQueue;
use motorctl::sensors::{RollingAverage, WindowedSink};

use motorctl::sim::adc_chip;

use crate::mock_hw::byte_select_adc;

struct CountingDelay {
    total_ns: u64,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

fn config(mode: TriggerMode) -> ControllerConfig {
    ControllerConfig {
        trigger_mode: mode,
        ..ControllerConfig::default()
    }
}

#[test]
fn full_scale_negative_window_averages_to_minus_9990() {
    let chip = adc_chip::chip(0x800);
    let rolling = RollingAverage::new();
    let (acc, reader) = rolling.split(100).unwrap();
    let mut acq = Acquisition::new(byte_select_adc(&chip), acc, &config(TriggerMode::TimerDriven));

    for _ in 0..100 {
        acq.on_timer_tick();
        chip.borrow_mut().finish();
        acq.on_ready_edge();
    }

    assert_eq!(reader.result(), -9990);
    assert_eq!(reader.windows(), 1);
    assert_eq!(acq.sink().count(), 0);
    assert_eq!(acq.stats().conversions, 100);
}

#[test]
fn partial_window_publishes_nothing() {
    let chip = adc_chip::chip(0x400);
    let rolling = RollingAverage::new();
    let (acc, mut reader) = rolling.split(100).unwrap();
    let mut acq = Acquisition::new(byte_select_adc(&chip), acc, &config(TriggerMode::TimerDriven));

    for _ in 0..99 {
        acq.on_timer_tick();
        chip.borrow_mut().finish();
        acq.on_ready_edge();
    }
    assert_eq!(reader.fresh(), None);
    assert_eq!(acq.sink().count(), 99);
}

#[test]
fn polled_timeout_is_bounded() {
    let chip = adc_chip::chip(0x123);
    chip.borrow_mut().stuck = true;
    let rolling = RollingAverage::new();
    let (acc, _reader) = rolling.split(1).unwrap();
    let cfg = ControllerConfig {
        conversion_timeout_us: 50,
        poll_interval_us: 5,
        ..config(TriggerMode::Polled)
    };
    let mut acq = Acquisition::new(byte_select_adc(&chip), acc, &cfg);
    let mut delay = CountingDelay { total_ns: 0 };

    assert_eq!(
        acq.sample(&mut delay),
        Err(Error::Acquisition(AcquisitionError::ConversionTimeout))
    );
    assert_eq!(delay.total_ns, 50_000);
    assert_eq!(acq.state(), AcquisitionState::Idle);
}

#[test]
fn polled_sample_leaves_byte_line_low() {
    let chip = adc_chip::chip(0xABC);
    let rolling = RollingAverage::new();
    let (acc, _reader) = rolling.split(1).unwrap();
    let mut acq = Acquisition::new(byte_select_adc(&chip), acc, &config(TriggerMode::Polled));
    let mut delay = CountingDelay { total_ns: 0 };

    let raw = acq.sample(&mut delay).unwrap();
    assert_eq!(raw.code(), 0xABC);
    assert!(!chip.borrow().byte_high);
}

#[test]
fn edge_driven_stream_through_isr_cell_into_queue() {
    let chip = adc_chip::chip(0x7FF);
    let rolling = RollingAverage::new();
    let averages: SampleQueue<i32, 4> = SampleQueue::new();
    let (acc, _reader) = rolling.split(10).unwrap();

    let cell = IsrCell::new();
    cell.install(Acquisition::new(
        byte_select_adc(&chip),
        WindowedSink::new(acc, &averages),
        &config(TriggerMode::EdgeDriven),
    ));

    cell.with(|acq| acq.arm());
    for _ in 0..30 {
        chip.borrow_mut().finish();
        cell.with(|acq| acq.on_ready_edge());
    }

    assert_eq!(averages.len(), 3);
    assert_eq!(averages.try_get(), Some(9985));
    assert_eq!(chip.borrow().conversions, 31);
}

#[test]
fn sink_overflow_counts_lost_windows_and_keeps_sampling() {
    let chip = adc_chip::chip(0x100);
    let rolling = RollingAverage::new();
    let averages: SampleQueue<i32, 2> = SampleQueue::new();
    let (acc, _reader) = rolling.split(1).unwrap();
    let mut acq = Acquisition::new(
        byte_select_adc(&chip),
        WindowedSink::new(acc, &averages),
        &config(TriggerMode::TimerDriven),
    );

    for _ in 0..5 {
        acq.pending(PendingIrqs {
            ready_edge: false,
            timer_tick: true,
        });
        chip.borrow_mut().finish();
        acq.pending(PendingIrqs {
            ready_edge: true,
            timer_tick: false,
        });
    }

    assert!(averages.is_full());
    assert_eq!(averages.lost_count(), 3);
    assert_eq!(acq.stats().dropped, 3);
    assert_eq!(acq.stats().conversions, 5);
}

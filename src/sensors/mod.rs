//! Signal conditioning between the ADC and the control law.

pub mod averager;
pub mod tacho;

pub use averager::{Accumulator, AverageReader, RollingAverage, WindowedSink};
pub use tacho::{Tachometer, to_millivolts};

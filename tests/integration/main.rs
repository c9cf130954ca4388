//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock hardware.  Everything runs on the host.

mod acquisition_tests;
mod mock_hw;
mod queue_tests;
mod service_tests;

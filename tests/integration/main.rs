//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives a whole `Headset` over the
//! simulated PMIC.  All tests run on the host with no real hardware.

mod detection_tests;
mod key_tests;
mod lifecycle_tests;

//! Blocking delay used for the post-insertion settle wait.
//!
//! Implements `embedded_hal::delay::DelayNs` on top of the host scheduler so
//! the detection path can be driven by any HAL delay on target and by this
//! one on std builds.  The wait only blocks the calling handler context.

use embedded_hal::delay::DelayNs;

/// `DelayNs` backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl ThreadDelay {
    pub fn new() -> Self {
        Self
    }
}

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

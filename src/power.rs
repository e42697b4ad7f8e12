//! Low-power flags gating the audio bias regulator.
//!
//! Two independent flags share one regulator: the *detect* flag follows
//! accessory presence, the *macro* flag follows the vendor detection burst.
//! Each flag only touches the regulator on a real transition, so redundant
//! events never produce an audible mode toggle.
//!
//! ```text
//!   set()   : clear ──▶ Standby ──▶ set
//!   clear() : set   ──▶ Normal  ──▶ clear
//!   (already in target state → no regulator access)
//! ```

use log::debug;

use crate::app::ports::{RegulatorMode, RegulatorPort};
use crate::error::BusError;

/// One idempotent low-power gate.
#[derive(Debug, Clone)]
pub struct LowPowerFlag {
    name: &'static str,
    set: bool,
}

impl LowPowerFlag {
    /// New flag in the low-power (set) state, matching the regulator's
    /// state at attach.
    pub fn new(name: &'static str) -> Self {
        Self { name, set: true }
    }

    /// `true` while the flag holds the regulator in standby.
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Put the regulator into standby unless this flag already did.
    ///
    /// Returns whether the regulator was touched.  The flag only changes
    /// once the mode change succeeded.
    pub fn set(&mut self, regulator: &mut impl RegulatorPort) -> Result<bool, BusError> {
        if self.set {
            return Ok(false);
        }
        regulator.set_mode(RegulatorMode::Standby)?;
        self.set = true;
        debug!("low-power {}: set (standby)", self.name);
        Ok(true)
    }

    /// Put the regulator into normal mode unless this flag already did.
    pub fn clear(&mut self, regulator: &mut impl RegulatorPort) -> Result<bool, BusError> {
        if !self.set {
            return Ok(false);
        }
        regulator.set_mode(RegulatorMode::Normal)?;
        self.set = false;
        debug!("low-power {}: cleared (normal)", self.name);
        Ok(true)
    }
}

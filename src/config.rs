//! Driver configuration
//!
//! Timing, vendor and naming parameters for one jack instance.  Defaults
//! match the CPCAP reference board; a host can override them from JSON.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::regs;

/// Capacity of the supply and switch name strings.
pub const NAME_CAP: usize = 16;

/// PMIC silicon vendor.  Only ST parts run the detection macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PmicVendor {
    #[default]
    Ti,
    St,
}

impl PmicVendor {
    pub fn has_detect_macro(self) -> bool {
        self == Self::St
    }
}

/// Per-instance driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JackConfig {
    // --- Timing ---
    /// PTT settle wait after insertion (milliseconds)
    pub settle_ms: u32,
    /// Delay before the button interrupt is re-enabled (milliseconds)
    pub mb2_rearm_ms: u32,
    /// Delay before the macro interrupt is re-enabled (milliseconds)
    pub macro_rearm_ms: u32,

    // --- Hardware ---
    pub vendor: PmicVendor,
    /// Regulator supplying the mic bias
    pub supply_name: String<NAME_CAP>,
    /// Fixed bias voltage programmed at attach (microvolts)
    pub supply_microvolts: u32,

    // --- Platform ---
    /// Name of the accessory-state switch device
    pub switch_name: String<NAME_CAP>,
    /// Input key code reported for the headset button
    pub media_key_code: u16,
}

impl Default for JackConfig {
    fn default() -> Self {
        Self {
            settle_ms: 11,
            mb2_rearm_ms: 200,
            macro_rearm_ms: 200,

            vendor: PmicVendor::Ti,
            supply_name: short_name("vaudio"),
            supply_microvolts: 2_775_000,

            switch_name: short_name("h2w"),
            media_key_code: regs::KEY_MEDIA,
        }
    }
}

impl JackConfig {
    /// Reject values that would block a handler for too long or disable a
    /// re-arm entirely.
    pub fn validate(&self) -> Result<()> {
        if !(1..=50).contains(&self.settle_ms) {
            return Err(Error::Config("settle_ms must be within 1..=50"));
        }
        if !(1..=5000).contains(&self.mb2_rearm_ms) {
            return Err(Error::Config("mb2_rearm_ms must be within 1..=5000"));
        }
        if !(1..=5000).contains(&self.macro_rearm_ms) {
            return Err(Error::Config("macro_rearm_ms must be within 1..=5000"));
        }
        if self.supply_microvolts == 0 {
            return Err(Error::Config("supply_microvolts must be non-zero"));
        }
        if self.supply_name.is_empty() {
            return Err(Error::Config("supply_name is empty"));
        }
        if self.switch_name.is_empty() {
            return Err(Error::Config("switch_name is empty"));
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity name, truncating at [`NAME_CAP`] bytes.
pub fn short_name(s: &str) -> String<NAME_CAP> {
    let mut name = String::new();
    for c in s.chars() {
        if name.push(c).is_err() {
            break;
        }
    }
    name
}

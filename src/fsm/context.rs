//! Shared mutable context touched by every handler and re-arm body.
//!
//! `JackContext` owns the hardware ports together with the driver state
//! (accessory classification, key state, both low-power flags).  The
//! [`Headset`](crate::app::service::Headset) keeps it behind one mutex, which
//! is the single mutual-exclusion domain for the three interrupt handlers
//! and the two re-arm bodies.

use crate::drivers::media_key::{KeyState, MediaKey};
use crate::power::LowPowerFlag;

use super::{AccessoryState, DetectPhase};

/// Driver state plus the ports it drives.
pub struct JackContext<P, R, N> {
    // -- Ports --
    pub(crate) pmic: P,
    pub(crate) regulator: R,
    pub(crate) sink: N,

    // -- Detection --
    pub(crate) accessory: AccessoryState,
    pub(crate) phase: DetectPhase,

    // -- Key --
    pub(crate) key: MediaKey,

    // -- Power --
    /// Follows accessory presence.
    pub(crate) detect_flag: LowPowerFlag,
    /// Follows the vendor macro burst.
    pub(crate) macro_flag: LowPowerFlag,

    /// Macro source claimed at attach (ST parts).
    pub(crate) macro_enabled: bool,
}

impl<P, R, N> JackContext<P, R, N> {
    /// Fresh context: no accessory, key released, both flags in low power.
    pub fn new(pmic: P, regulator: R, sink: N, macro_enabled: bool) -> Self {
        Self {
            pmic,
            regulator,
            sink,
            accessory: AccessoryState::NoDevice,
            phase: DetectPhase::Idle,
            key: MediaKey::new(),
            detect_flag: LowPowerFlag::new("detect"),
            macro_flag: LowPowerFlag::new("macro"),
            macro_enabled,
        }
    }

    pub fn accessory(&self) -> AccessoryState {
        self.accessory
    }

    pub fn phase(&self) -> DetectPhase {
        self.phase
    }

    pub fn key_state(&self) -> KeyState {
        self.key.state()
    }

    pub fn detect_low_power(&self) -> bool {
        self.detect_flag.is_set()
    }

    pub fn macro_low_power(&self) -> bool {
        self.macro_flag.is_set()
    }

    pub fn macro_enabled(&self) -> bool {
        self.macro_enabled
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }
}

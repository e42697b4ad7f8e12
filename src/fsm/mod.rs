//! Accessory detection state machine.
//!
//! ```text
//!                     HS asserted
//!   ┌───────────────────────────────────────────────┐
//!   ▼                                               │
//! NoDevice ──[HS deasserted]──▶ Settling (11 ms) ──▶ classify
//!                                                   │
//!             PTT low ──────────────▶ HeadsetWithoutMic  + MB2 re-arm
//!             PTT high, MB2 low ────▶ HeadsetWithoutMic  (unsupported, no re-arm)
//!             PTT high, MB2 high ───▶ HeadsetWithMic     + MB2 re-arm
//! ```
//!
//! The HS handler is split at the settle wait into two phases so the caller
//! can sleep without holding the shared context lock.
//! [`begin_detection`](context::JackContext::begin_detection) programs the
//! hardware and reports whether a settle is needed;
//! [`classify`](context::JackContext::classify) reads the button lines
//! afterwards.  Every cycle ends with
//! [`publish`](context::JackContext::publish).

pub mod context;
pub mod states;

use core::fmt;

// ---------------------------------------------------------------------------
// Accessory classification
// ---------------------------------------------------------------------------

/// What is plugged into the jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum AccessoryState {
    #[default]
    NoDevice = 0,
    HeadsetWithMic = 1,
    HeadsetWithoutMic = 2,
}

impl AccessoryState {
    /// Numeric value exposed through the switch device.
    pub fn switch_value(self) -> u8 {
        self as u8
    }

    /// Inverse of [`switch_value`](Self::switch_value).
    pub fn from_switch_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NoDevice),
            1 => Some(Self::HeadsetWithMic),
            2 => Some(Self::HeadsetWithoutMic),
            _ => None,
        }
    }
}

impl fmt::Display for AccessoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoDevice => "No Device",
            Self::HeadsetWithMic => "Headset with mic",
            Self::HeadsetWithoutMic => "Headset without mic",
        })
    }
}

// ---------------------------------------------------------------------------
// Phase results
// ---------------------------------------------------------------------------

/// Where an HS cycle is between its two phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectPhase {
    #[default]
    Idle,
    /// Accessory configuration applied, waiting for PTT to settle.
    Settling,
}

/// Outcome of [`JackContext::begin_detection`](context::JackContext::begin_detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// HS reads "no accessory"; the cycle is complete.
    Removed,
    /// Accessory present; wait the settle delay, then classify.
    Settling,
}

/// Outcome of [`JackContext::classify`](context::JackContext::classify).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub state: AccessoryState,
    /// Whether the MB2 source should be re-armed after the settle window.
    pub rearm_mb2: bool,
}

/// Outcome of a button interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The event is stale; run the HS path instead.
    Redirect,
    /// The key was sampled; carries the number of events emitted.
    Reported(usize),
}

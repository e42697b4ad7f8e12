//! Port traits — the hexagonal boundary between the detection core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Headset (domain)
//! ```
//!
//! Driven adapters (PMIC transport, regulator, notification sink, timer
//! backend) implement these traits.  The
//! [`Headset`](super::service::Headset) consumes them via generics, so the
//! state machine never touches registers directly.
//!
//! ## Sense polarity
//!
//! Levels are reported exactly as the PMIC latches them.  The wiring makes
//! the meaning line-dependent and it is deliberately **not** normalised here:
//!
//! | Line | `Asserted` (1)         | `Deasserted` (0)             |
//! |------|------------------------|------------------------------|
//! | HS   | no accessory present   | accessory present            |
//! | MB2  | idle                   | button pressed / mic absent  |
//! | PTT  | idle                   | pressed / no mic bias        |

use core::fmt;
use core::time::Duration;

use crate::drivers::media_key::KeyState;
use crate::error::BusError;
use crate::fsm::AccessoryState;
use crate::regs;
use crate::scheduler::{ReArm, ReArmState};

// ───────────────────────────────────────────────────────────────
// Hardware identifiers
// ───────────────────────────────────────────────────────────────

/// The three jack sense lines exposed by the PMIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenseLine {
    /// Headset insertion sense.
    Hs,
    /// Microphone-bias / button sense.
    Mb2,
    /// Push-to-talk comparator sense.
    Ptt,
}

impl fmt::Display for SenseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hs => "HS",
            Self::Mb2 => "MB2",
            Self::Ptt => "PTT",
        })
    }
}

/// Raw latched level of a sense line.  See the module docs for polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseLevel {
    /// Sense bit reads 1.
    Asserted,
    /// Sense bit reads 0.
    Deasserted,
}

impl SenseLevel {
    /// Build from the raw sense bit.
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::Asserted } else { Self::Deasserted }
    }
}

/// Interrupt sources owned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrqSource {
    /// Headset insertion/removal.
    Hs,
    /// Button / mic-bias change.
    Mb2,
    /// Vendor microcontroller detection macro (ST parts only).
    Macro,
}

impl IrqSource {
    /// Map a PMIC interrupt line number to a source.  Unknown lines map to
    /// `None` and are ignored by the dispatcher.
    pub fn from_raw(line: u16) -> Option<Self> {
        match line {
            regs::IRQ_HS => Some(Self::Hs),
            regs::IRQ_MB2 => Some(Self::Mb2),
            regs::IRQ_UC_PRIMACRO_13 => Some(Self::Macro),
            _ => None,
        }
    }

    /// PMIC interrupt line number for this source.
    pub fn raw(self) -> u16 {
        match self {
            Self::Hs => regs::IRQ_HS,
            Self::Mb2 => regs::IRQ_MB2,
            Self::Macro => regs::IRQ_UC_PRIMACRO_13,
        }
    }
}

impl fmt::Display for IrqSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hs => "HS",
            Self::Mb2 => "MB2",
            Self::Macro => "macro",
        })
    }
}

/// Register blocks touched by the electrical configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterTarget {
    /// Audio-output bias path (RXOA).
    OutputBias,
    /// Transmit-input path (TXI).
    TransmitInput,
}

impl fmt::Display for RegisterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OutputBias => "RXOA",
            Self::TransmitInput => "TXI",
        })
    }
}

/// Operating mode of the audio bias regulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatorMode {
    Normal,
    Standby,
}

/// Out-of-band conditions reported alongside state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// Accessory is present but its mic and/or key wiring is not supported.
    UnsupportedMicOrKeys,
}

// ───────────────────────────────────────────────────────────────
// PMIC port (driven adapter: domain ↔ power-management IC)
// ───────────────────────────────────────────────────────────────

/// Everything the driver needs from the PMIC: sense reads, masked register
/// writes, and interrupt-source control.
pub trait PmicPort {
    /// Read the current latched level of a sense line.
    fn read_sense(&mut self, line: SenseLine) -> Result<SenseLevel, BusError>;

    /// Write `value` into the bits selected by `mask`.
    fn write_register(
        &mut self,
        target: RegisterTarget,
        mask: u16,
        value: u16,
    ) -> Result<(), BusError>;

    /// Stop an interrupt source from being delivered.
    fn mask_irq(&mut self, src: IrqSource) -> Result<(), BusError>;

    /// Allow an interrupt source to be delivered again.
    fn unmask_irq(&mut self, src: IrqSource) -> Result<(), BusError>;

    /// Discard any latched event on an interrupt source.
    fn clear_irq(&mut self, src: IrqSource) -> Result<(), BusError>;

    /// Claim an interrupt source for this instance.
    fn register_irq(&mut self, src: IrqSource) -> Result<(), BusError>;

    /// Release a previously claimed interrupt source.
    fn free_irq(&mut self, src: IrqSource);

    /// Start the vendor microcontroller detection macro.
    fn start_detect_macro(&mut self) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Regulator port (driven adapter: domain → power domain controller)
// ───────────────────────────────────────────────────────────────

/// Audio bias regulator handle.
pub trait RegulatorPort {
    /// Switch between normal and standby operation.
    fn set_mode(&mut self, mode: RegulatorMode) -> Result<(), BusError>;

    /// Program the output voltage window in microvolts.
    fn set_voltage(&mut self, min_uv: u32, max_uv: u32) -> Result<(), BusError>;
}

// ───────────────────────────────────────────────────────────────
// Notification sink (driven adapter: domain → platform)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget consumer of accessory states and key events.
///
/// Repeated identical states are delivered as-is; implementations must
/// tolerate them.
pub trait NotificationSink {
    /// A detection cycle finished with `state`.
    fn notify_state(&mut self, state: AccessoryState);

    /// The media key changed (or pulsed) to `key`.
    fn notify_key(&mut self, key: KeyState);

    /// A diagnostic condition was observed during classification.
    fn notify_diagnostic(&mut self, _diag: Diagnostic) {}
}

// ───────────────────────────────────────────────────────────────
// Deferred work (driven adapter: domain → timer backend)
// ───────────────────────────────────────────────────────────────

/// Timer backend for the two re-arm actions.
///
/// Bodies are supplied when the backend is built (see
/// [`ReArmBody`](crate::scheduler::ReArmBody)); the domain only schedules
/// and cancels by purpose.
pub trait DeferredWork {
    /// Arm `work` to run after `delay`.  Re-arms if already pending.
    fn schedule(&self, work: ReArm, delay: Duration);

    /// Cancel `work`.  On return the body is guaranteed not to be running
    /// and not to start later; blocks while a body is executing.  Returns
    /// `true` if a pending run was dropped.
    fn cancel_sync(&self, work: ReArm) -> bool;

    /// Current lifecycle state of `work`.
    fn state(&self, work: ReArm) -> ReArmState;
}

// ───────────────────────────────────────────────────────────────
// Interrupt entry points (driving side: dispatcher → domain)
// ───────────────────────────────────────────────────────────────

/// Handler interface invoked by an interrupt dispatcher.  Calls are
/// serialized: the dispatcher never re-enters while one is running.
pub trait IrqHandler {
    type Error;

    fn on_hs_event(&mut self) -> Result<(), Self::Error>;
    fn on_mb2_event(&mut self) -> Result<(), Self::Error>;
    fn on_macro_event(&mut self) -> Result<(), Self::Error>;
}

//! Unified error types for the jack detection driver.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! attach path and the interrupt handlers uniform. All variants are `Copy`
//! so they can be passed through the rollback path without allocation.

use core::fmt;

use crate::app::ports::{IrqSource, RegisterTarget, SenseLine};

// ---------------------------------------------------------------------------
// Top-level driver error
// ---------------------------------------------------------------------------

/// Every fallible operation in the driver funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A collaborator the instance cannot run without was not supplied.
    MissingDependency(&'static str),
    /// Claiming an interrupt source failed during attach.
    IrqRegistration(IrqSource),
    /// The PMIC or regulator transport reported a failure.
    Bus(BusError),
    /// Configuration is invalid.
    Config(&'static str),
    /// The deferred-work backend could not be started.
    Worker(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency(what) => write!(f, "missing dependency: {what}"),
            Self::IrqRegistration(src) => write!(f, "could not register {src} interrupt"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Worker(msg) => write!(f, "worker: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// A single PMIC / regulator access that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Reading a sense line failed.
    Sense(SenseLine),
    /// A masked register write failed.
    Register(RegisterTarget),
    /// Masking, unmasking, clearing or freeing an interrupt source failed.
    Irq(IrqSource),
    /// Changing the regulator mode or voltage failed.
    Regulator,
    /// Starting the PMIC microcontroller macro failed.
    Macro,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sense(line) => write!(f, "{line} sense read failed"),
            Self::Register(target) => write!(f, "{target} register write failed"),
            Self::Irq(src) => write!(f, "{src} interrupt access failed"),
            Self::Regulator => write!(f, "regulator access failed"),
            Self::Macro => write!(f, "macro start failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Driver-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

//! 3.5 mm headset jack detection driver.
//!
//! Classifies what is plugged into the jack from the PMIC's HS, MB2 and PTT
//! sense lines, debounces the single media button, keeps the audio bias
//! regulator in standby whenever nothing needs it, and re-enables noisy
//! interrupt sources after a delay.  All hardware access goes through the
//! port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod power;
pub mod regs;
pub mod scheduler;

pub use app::service::Headset;
pub use error::{BusError, Error, Result};

//! Application core — the headset instance and the ports it drives.
//!
//! All interaction with the PMIC, the audio regulator and the outside
//! world happens through the **port traits** defined in [`ports`], keeping
//! this layer testable against the simulated board.

pub mod events;
pub mod ports;
pub mod service;

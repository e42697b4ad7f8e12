//! Driver-level building blocks: key debouncing and the settle delay.

pub mod delay;
pub mod media_key;

//! Outbound events produced by the headset core.
//!
//! These are pushed to a [`NotificationSink`](super::ports::NotificationSink)
//! implementation, which can forward them to logs, a switch device, an
//! input subsystem, or a test recorder.

use crate::app::ports::Diagnostic;
use crate::drivers::media_key::KeyState;
use crate::fsm::AccessoryState;

/// Structured event emitted by the headset core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JackEvent {
    /// A detection cycle completed.  Sent even if the state is unchanged.
    StateChanged(AccessoryState),
    /// Media key edge, tagged with the input key code.
    Key { code: u16, state: KeyState },
    /// Accessory recognised but not fully usable.
    Diagnostic(Diagnostic),
}

impl JackEvent {
    pub fn key(code: u16, state: KeyState) -> Self {
        Self::Key { code, state }
    }
}

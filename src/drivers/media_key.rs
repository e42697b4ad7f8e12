//! Media-key debouncer for the single remote-control button.
//!
//! ## Hardware
//!
//! The button shorts the mic bias, pulling MB2 (and usually PTT) low.  The
//! PMIC raises MB2 on both edges, but a short tap can collapse into a
//! single interrupt whose sense read already shows the button released.
//!
//! ## Emit rule
//!
//! | Previous | New      | Emitted                          |
//! |----------|----------|----------------------------------|
//! | released | pressed  | `Pressed`                        |
//! | pressed  | released | `Released`                       |
//! | released | released | `Pressed`, `Released` (tap pulse)|
//! | pressed  | pressed  | nothing                          |
//!
//! The third row recovers a press too short to produce two edges.

use log::info;

use crate::app::ports::{NotificationSink, SenseLevel};

/// Logical state of the media key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Released,
    Pressed,
}

impl KeyState {
    /// Either line pulled low means the button is down.
    pub fn from_sense(mb2: SenseLevel, ptt: SenseLevel) -> Self {
        if mb2 == SenseLevel::Deasserted || ptt == SenseLevel::Deasserted {
            Self::Pressed
        } else {
            Self::Released
        }
    }

    pub fn is_pressed(self) -> bool {
        self == Self::Pressed
    }
}

/// Tracks the last emitted key state and applies the emit rule.
#[derive(Debug, Clone, Default)]
pub struct MediaKey {
    state: KeyState,
}

impl MediaKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded state.
    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Report a freshly sampled key state.  Returns the number of events
    /// emitted (0, 1 or 2).
    pub fn report(&mut self, new: KeyState, sink: &mut impl NotificationSink) -> usize {
        info!("Headset key event: old={:?}, new={:?}", self.state, new);

        if new != self.state {
            self.state = new;
            sink.notify_key(new);
            1
        } else if new == KeyState::Released {
            sink.notify_key(KeyState::Pressed);
            sink.notify_key(KeyState::Released);
            2
        } else {
            0
        }
    }

    /// Emit a release if the key is currently held (accessory removed).
    pub fn release_if_pressed(&mut self, sink: &mut impl NotificationSink) -> bool {
        if self.state.is_pressed() {
            self.report(KeyState::Released, sink);
            true
        } else {
            false
        }
    }
}

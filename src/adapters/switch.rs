//! Accessory-state switch device and key-event stream.
//!
//! [`SwitchDevice`] is the notification sink the platform sees: it keeps the
//! numeric accessory state readable at any time (printable as "No Device",
//! "Headset with mic" or "Headset without mic") and pushes every event into
//! a bounded `embassy-sync` channel.  Consumers hold a cloned
//! [`SwitchHandle`] and drain the channel from their own context.
//!
//! A full channel drops the newest event with a warning.  The switch state
//! itself is never lost because it is stored separately.

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use log::warn;

use crate::app::events::JackEvent;
use crate::app::ports::{Diagnostic, NotificationSink};
use crate::config::NAME_CAP;
use crate::drivers::media_key::KeyState;
use crate::fsm::AccessoryState;

/// Default depth of the event channel.
pub const EVENT_DEPTH: usize = 16;

type EventChannel<const N: usize> = Channel<CriticalSectionRawMutex, JackEvent, N>;

struct Shared<const N: usize> {
    name: String<NAME_CAP>,
    state: AtomicU8,
    events: EventChannel<N>,
}

/// Sink side.  Owned by the headset instance.
pub struct SwitchDevice<const N: usize = EVENT_DEPTH> {
    shared: Arc<Shared<N>>,
    key_code: u16,
}

/// Reader side.  Cheap to clone.
#[derive(Clone)]
pub struct SwitchHandle<const N: usize = EVENT_DEPTH> {
    shared: Arc<Shared<N>>,
}

impl<const N: usize> SwitchDevice<N> {
    /// Register a switch called `name` that tags key events with `key_code`.
    pub fn new(name: &str, key_code: u16) -> (Self, SwitchHandle<N>) {
        let shared = Arc::new(Shared {
            name: crate::config::short_name(name),
            state: AtomicU8::new(AccessoryState::NoDevice.switch_value()),
            events: Channel::new(),
        });
        (
            Self {
                shared: shared.clone(),
                key_code,
            },
            SwitchHandle { shared },
        )
    }

    fn push(&self, event: JackEvent) {
        if self.shared.events.try_send(event).is_err() {
            warn!("{}: event channel full, dropping {:?}", self.shared.name, event);
        }
    }
}

impl<const N: usize> NotificationSink for SwitchDevice<N> {
    fn notify_state(&mut self, state: AccessoryState) {
        self.shared
            .state
            .store(state.switch_value(), Ordering::Release);
        self.push(JackEvent::StateChanged(state));
    }

    fn notify_key(&mut self, key: KeyState) {
        self.push(JackEvent::key(self.key_code, key));
    }

    fn notify_diagnostic(&mut self, diag: Diagnostic) {
        self.push(JackEvent::Diagnostic(diag));
    }
}

impl<const N: usize> SwitchHandle<N> {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Last published accessory state.
    pub fn state(&self) -> AccessoryState {
        AccessoryState::from_switch_value(self.shared.state.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    /// Platform-visible state string.
    pub fn print_name(&self) -> &'static str {
        match self.state() {
            AccessoryState::NoDevice => "No Device",
            AccessoryState::HeadsetWithMic => "Headset with mic",
            AccessoryState::HeadsetWithoutMic => "Headset without mic",
        }
    }

    /// Pop the oldest pending event, if any.
    pub fn try_next_event(&self) -> Option<JackEvent> {
        self.shared.events.try_receive().ok()
    }

    /// Drain every pending event.
    pub fn drain(&self) -> Vec<JackEvent> {
        core::iter::from_fn(|| self.try_next_event()).collect()
    }
}

//! Log-based notification adapter.
//!
//! Implements [`NotificationSink`] by writing every accessory change, key
//! edge and diagnostic to the `log` facade.  Useful on its own for headless
//! hosts, or wrapped around another sink with [`LogSink::wrap`].

use log::{info, warn};

use crate::app::events::JackEvent;
use crate::app::ports::{Diagnostic, NotificationSink};
use crate::drivers::media_key::KeyState;
use crate::fsm::AccessoryState;

/// Adapter that logs every notification, then forwards it to `inner`.
pub struct LogSink<N = ()> {
    key_code: u16,
    inner: N,
}

impl LogSink<()> {
    pub fn new(key_code: u16) -> Self {
        Self {
            key_code,
            inner: (),
        }
    }
}

impl<N> LogSink<N> {
    pub fn wrap(key_code: u16, inner: N) -> Self {
        Self { key_code, inner }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    fn log(&self, event: &JackEvent) {
        match event {
            JackEvent::StateChanged(state) => {
                info!("SWITCH | state={} ({})", state.switch_value(), state);
            }
            JackEvent::Key { code, state } => {
                info!(
                    "KEY | code={} {}",
                    code,
                    if state.is_pressed() { "down" } else { "up" }
                );
            }
            JackEvent::Diagnostic(diag) => {
                warn!("DIAG | {:?}", diag);
            }
        }
    }
}

/// No-op terminal sink so a bare [`LogSink`] only logs.
impl NotificationSink for () {
    fn notify_state(&mut self, _state: AccessoryState) {}
    fn notify_key(&mut self, _key: KeyState) {}
}

impl<N: NotificationSink> NotificationSink for LogSink<N> {
    fn notify_state(&mut self, state: AccessoryState) {
        self.log(&JackEvent::StateChanged(state));
        self.inner.notify_state(state);
    }

    fn notify_key(&mut self, key: KeyState) {
        self.log(&JackEvent::key(self.key_code, key));
        self.inner.notify_key(key);
    }

    fn notify_diagnostic(&mut self, diag: Diagnostic) {
        self.log(&JackEvent::Diagnostic(diag));
        self.inner.notify_diagnostic(diag);
    }
}

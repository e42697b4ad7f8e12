//! Headset service — one attached jack instance.
//!
//! [`Headset`] owns the shared [`JackContext`], the re-arm timer backend and
//! the settle delay.  It sequences every handler around the context lock:
//! hardware accesses happen under the lock, while the settle wait and timer
//! cancellation happen outside it, so a re-arm body blocked on the lock can
//! never deadlock a synchronous cancel.
//!
//! ```text
//!  raw IRQ ──▶ handle_irq ──▶ ┌──────────────────────┐ ──▶ NotificationSink
//!                             │       Headset        │
//!  DeferredWork ◀─ schedule ──│ JackContext (Mutex)  │──▶ PmicPort / RegulatorPort
//!        └──── ReArmBody ────▶└──────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::JackConfig;
use crate::drivers::media_key::KeyState;
use crate::error::{BusError, Error, Result};
use crate::fsm::context::JackContext;
use crate::fsm::{AccessoryState, Detection, KeyOutcome};
use crate::scheduler::{ReArm, ReArmBody};

use super::ports::{
    DeferredWork, IrqHandler, IrqSource, NotificationSink, PmicPort, RegulatorPort,
};

type Shared<P, R, N> = Arc<Mutex<JackContext<P, R, N>>>;

fn lock<P, R, N>(ctx: &Mutex<JackContext<P, R, N>>) -> MutexGuard<'_, JackContext<P, R, N>> {
    ctx.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// Headset
// ───────────────────────────────────────────────────────────────

/// One attached 3.5 mm jack.
pub struct Headset<P, R, N, T, D> {
    ctx: Shared<P, R, N>,
    timers: T,
    delay: D,
    config: JackConfig,
}

impl<P, R, N, T, D> Headset<P, R, N, T, D>
where
    P: PmicPort + Send + 'static,
    R: RegulatorPort + Send + 'static,
    N: NotificationSink + Send + 'static,
    T: DeferredWork,
    D: DelayNs,
{
    // ── Lifecycle ─────────────────────────────────────────────

    /// Claim the hardware and run an initial detection cycle.
    ///
    /// `make_timers` receives the re-arm body and builds the timer backend
    /// (for example `TimerWorker::spawn` or `TickTimers::new`).  On failure
    /// every interrupt source already claimed is released in reverse order
    /// and nothing is left behind.
    pub fn attach<F>(
        mut pmic: P,
        regulator: Option<R>,
        sink: N,
        delay: D,
        config: JackConfig,
        make_timers: F,
    ) -> Result<Self>
    where
        F: FnOnce(ReArmBody) -> Result<T>,
    {
        config.validate()?;

        let Some(mut regulator) = regulator else {
            error!("Could not get regulator {}", config.supply_name);
            return Err(Error::MissingDependency("regulator"));
        };

        regulator.set_voltage(config.supply_microvolts, config.supply_microvolts)?;

        pmic.clear_irq(IrqSource::Hs)?;
        pmic.clear_irq(IrqSource::Mb2)?;
        pmic.clear_irq(IrqSource::Macro)?;

        let macro_enabled = config.vendor.has_detect_macro();
        let claimed = claim_sources(&mut pmic, macro_enabled)?;

        if macro_enabled {
            if let Err(e) = pmic.start_detect_macro() {
                release_sources(&mut pmic, &claimed);
                return Err(e.into());
            }
        }

        let ctx: Shared<P, R, N> = Arc::new(Mutex::new(JackContext::new(
            pmic,
            regulator,
            sink,
            macro_enabled,
        )));

        let timers = match make_timers(rearm_body(Arc::downgrade(&ctx))) {
            Ok(t) => t,
            Err(e) => {
                release_sources(&mut lock(&ctx).pmic, &claimed);
                return Err(e);
            }
        };

        let mut headset = Self {
            ctx,
            timers,
            delay,
            config,
        };

        info!(
            "{}: attached ({:?}, macro={})",
            headset.config.switch_name, headset.config.vendor, macro_enabled
        );

        // Synthetic HS event establishes the initial state.  A transport
        // failure here leaves the instance rolled back to NoDevice.
        if let Err(e) = headset.on_hs_event() {
            warn!("initial detection failed: {e}");
        }

        Ok(headset)
    }

    /// Cancel both re-arms and release every interrupt source.  Returns the
    /// timer backend so the caller decides when it is torn down.
    pub fn detach(self) -> T {
        self.timers.cancel_sync(ReArm::Macro);
        self.timers.cancel_sync(ReArm::Mb2);

        {
            let mut ctx = lock(&self.ctx);
            ctx.pmic.free_irq(IrqSource::Mb2);
            ctx.pmic.free_irq(IrqSource::Hs);
            if ctx.macro_enabled {
                ctx.pmic.free_irq(IrqSource::Macro);
            }
        }

        info!("{}: detached", self.config.switch_name);
        self.timers
    }

    /// Drop the bias for a mic-less headset while the system sleeps.
    pub fn suspend(&mut self) -> Result<()> {
        lock(&self.ctx).suspend().map_err(Error::from)
    }

    pub fn resume(&mut self) -> Result<()> {
        lock(&self.ctx).resume().map_err(Error::from)
    }

    // ── Interrupt dispatch ────────────────────────────────────

    /// Route a raw PMIC interrupt line to its handler.  Unknown lines and
    /// macro interrupts on parts without the macro are ignored.
    pub fn handle_irq(&mut self, line: u16) -> Result<()> {
        match IrqSource::from_raw(line) {
            Some(IrqSource::Hs) => self.on_hs_event(),
            Some(IrqSource::Mb2) => self.on_mb2_event(),
            Some(IrqSource::Macro) => self.on_macro_event(),
            None => {
                debug!("ignoring unknown interrupt {line}");
                Ok(())
            }
        }
    }

    fn detect(&mut self) -> core::result::Result<(), BusError> {
        let detection = lock(&self.ctx).begin_detection()?;
        if detection == Detection::Removed {
            lock(&self.ctx).publish(AccessoryState::NoDevice);
            return Ok(());
        }

        // Let PTT settle with the lock released.
        self.delay.delay_ms(self.config.settle_ms);

        let rearm_mb2 = {
            let mut ctx = lock(&self.ctx);
            match ctx.classify()? {
                Some(c) => {
                    ctx.publish(c.state);
                    c.rearm_mb2
                }
                // Rolled back while settling.
                None => false,
            }
        };
        if rearm_mb2 {
            self.timers.schedule(
                ReArm::Mb2,
                Duration::from_millis(self.config.mb2_rearm_ms.into()),
            );
        }
        Ok(())
    }

    /// Cancel all deferred work and force the no-accessory state.
    fn recover(&mut self, e: BusError) -> Error {
        error!("{}: {e}", self.config.switch_name);
        self.timers.cancel_sync(ReArm::Mb2);
        self.timers.cancel_sync(ReArm::Macro);
        lock(&self.ctx).roll_back();
        Error::Bus(e)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn accessory(&self) -> AccessoryState {
        lock(&self.ctx).accessory()
    }

    pub fn key_state(&self) -> KeyState {
        lock(&self.ctx).key_state()
    }

    pub fn detect_low_power(&self) -> bool {
        lock(&self.ctx).detect_low_power()
    }

    pub fn macro_low_power(&self) -> bool {
        lock(&self.ctx).macro_low_power()
    }

    pub fn macro_enabled(&self) -> bool {
        lock(&self.ctx).macro_enabled()
    }

    pub fn config(&self) -> &JackConfig {
        &self.config
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Run `f` against the notification sink under the context lock.
    pub fn with_sink<U>(&self, f: impl FnOnce(&mut N) -> U) -> U {
        f(lock(&self.ctx).sink_mut())
    }
}

impl<P, R, N, T, D> IrqHandler for Headset<P, R, N, T, D>
where
    P: PmicPort + Send + 'static,
    R: RegulatorPort + Send + 'static,
    N: NotificationSink + Send + 'static,
    T: DeferredWork,
    D: DelayNs,
{
    type Error = Error;

    fn on_hs_event(&mut self) -> Result<()> {
        // A pending MB2 re-arm belongs to the previous accessory.
        self.timers.cancel_sync(ReArm::Mb2);
        self.detect().map_err(|e| self.recover(e))
    }

    fn on_mb2_event(&mut self) -> Result<()> {
        let outcome = lock(&self.ctx).handle_key();
        match outcome {
            Ok(KeyOutcome::Redirect) => {
                debug!("button event without a mic headset, re-detecting");
                self.on_hs_event()
            }
            Ok(KeyOutcome::Reported(_)) => Ok(()),
            Err(e) => Err(self.recover(e)),
        }
    }

    fn on_macro_event(&mut self) -> Result<()> {
        if !self.macro_enabled() {
            debug!("ignoring macro interrupt on a part without the macro");
            return Ok(());
        }
        let burst = lock(&self.ctx).begin_macro_burst();
        match burst {
            Ok(()) => {
                self.timers.schedule(
                    ReArm::Macro,
                    Duration::from_millis(self.config.macro_rearm_ms.into()),
                );
                Ok(())
            }
            Err(e) => Err(self.recover(e)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Attach helpers
// ───────────────────────────────────────────────────────────────

/// Register HS, MB2 and (optionally) the macro source in that order.  On
/// failure the ones already registered are freed in reverse order.
fn claim_sources<P: PmicPort>(pmic: &mut P, with_macro: bool) -> Result<Vec<IrqSource>> {
    let mut wanted = vec![IrqSource::Hs, IrqSource::Mb2];
    if with_macro {
        wanted.push(IrqSource::Macro);
    }

    let mut claimed = Vec::with_capacity(wanted.len());
    for src in wanted {
        if let Err(e) = pmic.register_irq(src) {
            error!("Could not register {src} interrupt: {e}");
            release_sources(pmic, &claimed);
            return Err(Error::IrqRegistration(src));
        }
        claimed.push(src);
    }
    Ok(claimed)
}

fn release_sources<P: PmicPort>(pmic: &mut P, claimed: &[IrqSource]) {
    for &src in claimed.iter().rev() {
        pmic.free_irq(src);
    }
}

/// Build the re-arm body.  It holds only a weak reference so a detached
/// instance is not kept alive by its own timer backend.
fn rearm_body<P, R, N>(ctx: Weak<Mutex<JackContext<P, R, N>>>) -> ReArmBody
where
    P: PmicPort + Send + 'static,
    R: RegulatorPort + Send + 'static,
    N: NotificationSink + Send + 'static,
{
    Arc::new(move |work: ReArm| {
        let Some(ctx) = ctx.upgrade() else {
            return;
        };
        let mut ctx = lock(&ctx);
        if let Err(e) = ctx.run_rearm(work) {
            // The other re-arm may still fire afterwards; it only unmasks a
            // source, which the next HS cycle reconciles.
            error!("{}: {e}", work.label());
            ctx.roll_back();
        }
    })
}

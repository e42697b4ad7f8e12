//! Transition handlers for the detection state machine, the key path, the
//! macro path, and the two re-arm bodies.
//!
//! Every handler runs with the context lock held and performs only
//! non-blocking hardware accesses.  Sleeping (the settle wait) and timer
//! control happen in the [`Headset`](crate::app::service::Headset) between
//! handler calls.

use log::{info, warn};

use super::context::JackContext;
use super::{AccessoryState, Classification, DetectPhase, Detection, KeyOutcome};
use crate::app::ports::{
    Diagnostic, IrqSource, NotificationSink, PmicPort, RegisterTarget, RegulatorPort, SenseLevel,
    SenseLine,
};
use crate::drivers::media_key::KeyState;
use crate::error::BusError;
use crate::regs;
use crate::scheduler::ReArm;

impl<P, R, N> JackContext<P, R, N>
where
    P: PmicPort,
    R: RegulatorPort,
    N: NotificationSink,
{
    // ═══════════════════════════════════════════════════════════════════════
    //  HS path
    // ═══════════════════════════════════════════════════════════════════════

    /// First phase of an HS event.  The caller must already have cancelled
    /// the MB2 re-arm.
    pub fn begin_detection(&mut self) -> Result<Detection, BusError> {
        // HS sense of 1 means no headset present, 0 means headset attached.
        if self.pmic.read_sense(SenseLine::Hs)? == SenseLevel::Asserted {
            self.apply_removed_config()?;
            self.detect_flag.set(&mut self.regulator)?;

            // No button can exist without an accessory.
            self.pmic.mask_irq(IrqSource::Mb2)?;
            self.pmic.clear_irq(IrqSource::Mb2)?;
            self.pmic.unmask_irq(IrqSource::Hs)?;

            self.key.release_if_pressed(&mut self.sink);
            self.phase = DetectPhase::Idle;
            Ok(Detection::Removed)
        } else {
            self.apply_present_config()?;
            self.detect_flag.clear(&mut self.regulator)?;
            self.phase = DetectPhase::Settling;
            Ok(Detection::Settling)
        }
    }

    /// Second phase of an HS event, after the settle delay.
    ///
    /// Returns `None` without touching the hardware when no settle window is
    /// open, e.g. a re-arm body rolled the context back during the wait.
    /// The rolled-back state stands and the caller publishes nothing.
    pub fn classify(&mut self) -> Result<Option<Classification>, BusError> {
        if self.phase != DetectPhase::Settling {
            warn!("settle window closed before classification, skipping");
            return Ok(None);
        }

        let classification = if self.pmic.read_sense(SenseLine::Ptt)? == SenseLevel::Deasserted {
            // Headset without mic and MFB.  May also be a headset with the
            // MFB held down during insertion.
            Classification {
                state: AccessoryState::HeadsetWithoutMic,
                rearm_mb2: true,
            }
        } else if self.pmic.read_sense(SenseLine::Mb2)? == SenseLevel::Deasserted {
            info!("Headset with unsupported MIC and/or keys");
            self.sink.notify_diagnostic(Diagnostic::UnsupportedMicOrKeys);
            Classification {
                state: AccessoryState::HeadsetWithoutMic,
                rearm_mb2: false,
            }
        } else {
            Classification {
                state: AccessoryState::HeadsetWithMic,
                rearm_mb2: true,
            }
        };

        self.pmic.unmask_irq(IrqSource::Hs)?;
        self.phase = DetectPhase::Idle;
        Ok(Some(classification))
    }

    /// Record and broadcast the result of a detection cycle.  Always
    /// notifies, even when the state did not change.
    pub fn publish(&mut self, state: AccessoryState) {
        self.accessory = state;
        self.sink.notify_state(state);
        info!("New headset state: {} ({})", state.switch_value(), state);
    }

    fn apply_present_config(&mut self) -> Result<(), BusError> {
        self.pmic.write_register(
            RegisterTarget::TransmitInput,
            regs::TXI_JACK_MASK,
            regs::TXI_JACK_MASK,
        )?;
        self.pmic.write_register(
            RegisterTarget::OutputBias,
            regs::RXOA_ST_HS_CP_EN,
            regs::RXOA_ST_HS_CP_EN,
        )
    }

    fn apply_removed_config(&mut self) -> Result<(), BusError> {
        self.pmic
            .write_register(RegisterTarget::TransmitInput, regs::TXI_JACK_MASK, 0)?;
        self.pmic
            .write_register(RegisterTarget::OutputBias, regs::RXOA_ST_HS_CP_EN, 0)
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  MB2 path
    // ═══════════════════════════════════════════════════════════════════════

    /// Handle a button interrupt.  Returns [`KeyOutcome::Redirect`] when the
    /// accessory is gone or cannot carry a button; the caller then runs the
    /// HS path instead.
    pub fn handle_key(&mut self) -> Result<KeyOutcome, BusError> {
        if self.pmic.read_sense(SenseLine::Hs)? == SenseLevel::Asserted
            || self.accessory != AccessoryState::HeadsetWithMic
        {
            return Ok(KeyOutcome::Redirect);
        }

        let mb2 = self.pmic.read_sense(SenseLine::Mb2)?;
        let ptt = self.pmic.read_sense(SenseLine::Ptt)?;
        let emitted = self.key.report(KeyState::from_sense(mb2, ptt), &mut self.sink);

        self.pmic.unmask_irq(IrqSource::Mb2)?;
        Ok(KeyOutcome::Reported(emitted))
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Macro path
    // ═══════════════════════════════════════════════════════════════════════

    /// Keep the bias up for the microcontroller detection burst.
    pub fn begin_macro_burst(&mut self) -> Result<(), BusError> {
        self.macro_flag.clear(&mut self.regulator)?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Re-arm bodies
    // ═══════════════════════════════════════════════════════════════════════

    pub fn run_rearm(&mut self, work: ReArm) -> Result<(), BusError> {
        match work {
            ReArm::Mb2 => {
                self.pmic.clear_irq(IrqSource::Mb2)?;
                self.pmic.unmask_irq(IrqSource::Mb2)
            }
            ReArm::Macro => {
                self.macro_flag.set(&mut self.regulator)?;
                self.pmic.unmask_irq(IrqSource::Macro)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Power management
    // ═══════════════════════════════════════════════════════════════════════

    /// A mic-less headset needs no bias while the system sleeps.
    pub fn suspend(&mut self) -> Result<(), BusError> {
        if self.accessory == AccessoryState::HeadsetWithoutMic {
            self.detect_flag.set(&mut self.regulator)?;
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), BusError> {
        if self.accessory == AccessoryState::HeadsetWithoutMic {
            self.detect_flag.clear(&mut self.regulator)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Failure recovery
    // ═══════════════════════════════════════════════════════════════════════

    /// Return to "no accessory, all flags set" after a transport failure.
    /// Both re-arms must already be cancelled.  Every step is attempted even
    /// if an earlier one fails.
    pub fn roll_back(&mut self) {
        warn!("rolling back to no-accessory state");
        self.phase = DetectPhase::Idle;

        log_failure("detect flag", self.detect_flag.set(&mut self.regulator));
        log_failure("macro flag", self.macro_flag.set(&mut self.regulator));
        log_failure("removed config", self.apply_removed_config());
        log_failure("MB2 mask", self.pmic.mask_irq(IrqSource::Mb2));
        log_failure("MB2 clear", self.pmic.clear_irq(IrqSource::Mb2));
        log_failure("HS unmask", self.pmic.unmask_irq(IrqSource::Hs));
        if self.macro_enabled {
            log_failure("macro unmask", self.pmic.unmask_irq(IrqSource::Macro));
        }

        self.key.release_if_pressed(&mut self.sink);
        self.publish(AccessoryState::NoDevice);
    }
}

fn log_failure<T>(step: &str, result: Result<T, BusError>) {
    if let Err(e) = result {
        warn!("rollback: {step} failed: {e}");
    }
}

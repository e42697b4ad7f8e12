//! Attach, detach, suspend/resume and the vendor macro path.

use std::time::Duration;

use jackdetect::adapters::sim::{SimBoard, SimCall, SimPmic, SimRegulator};
use jackdetect::app::ports::{IrqSource, RegulatorMode, SenseLine};
use jackdetect::config::{JackConfig, PmicVendor};
use jackdetect::fsm::AccessoryState;
use jackdetect::regs;
use jackdetect::scheduler::ReArm;
use jackdetect::{Error, Headset};

use crate::mock_hw::{RecordingDelay, RecordingSink, RecordingTimers, Rig, TimerOp};

fn st_config() -> JackConfig {
    JackConfig {
        vendor: PmicVendor::St,
        ..JackConfig::default()
    }
}

fn frees(calls: &[SimCall]) -> Vec<IrqSource> {
    calls
        .iter()
        .filter_map(|c| match c {
            SimCall::Free(src) => Some(*src),
            _ => None,
        })
        .collect()
}

// ── Attach ────────────────────────────────────────────────────

#[test]
fn attach_programs_supply_and_clears_sources_first() {
    let rig = Rig::new();
    let calls = rig.board.calls();

    assert_eq!(calls[0], SimCall::SetVoltage(2_775_000, 2_775_000));
    assert_eq!(
        &calls[1..6],
        &[
            SimCall::Clear(IrqSource::Hs),
            SimCall::Clear(IrqSource::Mb2),
            SimCall::Clear(IrqSource::Macro),
            SimCall::Register(IrqSource::Hs),
            SimCall::Register(IrqSource::Mb2),
        ]
    );
    assert!(!rig.board.is_registered(IrqSource::Macro));
    assert!(!rig.board.macro_started());
}

#[test]
fn missing_regulator_fails_without_side_effects() {
    let board = SimBoard::new();
    let result: jackdetect::Result<
        Headset<SimPmic, SimRegulator, RecordingSink, RecordingTimers, RecordingDelay>,
    > = Headset::attach(
        board.pmic(),
        None,
        RecordingSink::default(),
        RecordingDelay::default(),
        JackConfig::default(),
        |_| unreachable!("timers are built after the hardware is claimed"),
    );

    assert!(matches!(result, Err(Error::MissingDependency(_))));
    assert!(board.calls().is_empty());
}

#[test]
fn registration_failure_releases_claimed_sources_in_reverse() {
    let board = SimBoard::new();
    board.fail_register(Some(IrqSource::Macro));

    let result = Rig::attach(board.clone(), st_config());

    assert!(matches!(
        result,
        Err(Error::IrqRegistration(IrqSource::Macro))
    ));
    assert_eq!(frees(&board.calls()), vec![IrqSource::Mb2, IrqSource::Hs]);
    assert!(!board.is_registered(IrqSource::Hs));
    assert!(!board.is_registered(IrqSource::Mb2));
    assert!(!board.macro_started());
}

#[test]
fn button_registration_failure_releases_hs() {
    let board = SimBoard::new();
    board.fail_register(Some(IrqSource::Mb2));

    let result = Rig::attach(board.clone(), JackConfig::default());

    assert!(matches!(result, Err(Error::IrqRegistration(IrqSource::Mb2))));
    assert_eq!(frees(&board.calls()), vec![IrqSource::Hs]);
}

#[test]
fn failed_initial_detection_still_attaches() {
    let board = SimBoard::new();
    board.fail_sense(Some(SenseLine::Hs));

    let rig = Rig::attach(board, JackConfig::default()).unwrap();

    assert_eq!(rig.headset.accessory(), AccessoryState::NoDevice);
    assert_eq!(rig.sink.states(), vec![AccessoryState::NoDevice]);
    assert!(rig.headset.detect_low_power());
}

// ── Macro path ────────────────────────────────────────────────

#[test]
fn st_parts_start_the_detection_macro() {
    let rig = Rig::attach(SimBoard::new(), st_config()).unwrap();

    assert!(rig.headset.macro_enabled());
    assert!(rig.board.is_registered(IrqSource::Macro));
    assert!(rig.board.macro_started());
}

#[test]
fn macro_burst_holds_bias_until_rearm() {
    let mut rig = Rig::attach(SimBoard::new(), st_config()).unwrap();
    rig.take_timer_ops();

    assert!(rig.fire(IrqSource::Macro).unwrap());
    assert!(!rig.headset.macro_low_power());
    assert!(rig.headset.detect_low_power());
    assert_eq!(rig.board.regulator_modes(), vec![RegulatorMode::Normal]);
    assert_eq!(
        rig.take_timer_ops(),
        vec![TimerOp::Schedule(
            ReArm::Macro,
            Duration::from_millis(200)
        )]
    );
    assert!(rig.board.is_masked(IrqSource::Macro));

    assert_eq!(rig.advance_ms(200), 1);
    assert!(rig.headset.macro_low_power());
    assert!(!rig.board.is_masked(IrqSource::Macro));
    assert_eq!(
        rig.board.regulator_modes(),
        vec![RegulatorMode::Normal, RegulatorMode::Standby]
    );
}

#[test]
fn macro_line_is_ignored_on_ti_parts() {
    let mut rig = Rig::new();
    rig.board.take_calls();

    rig.headset.handle_irq(regs::IRQ_UC_PRIMACRO_13).unwrap();

    assert!(rig.board.take_calls().is_empty());
    assert!(
        rig.take_timer_ops()
            .iter()
            .all(|op| !matches!(op, TimerOp::Schedule(ReArm::Macro, _)))
    );
}

#[test]
fn unknown_lines_are_ignored() {
    let mut rig = Rig::with_mic_headset();
    rig.board.take_calls();

    rig.headset.handle_irq(regs::IRQ_PTT).unwrap();
    rig.headset.handle_irq(0).unwrap();

    assert!(rig.board.take_calls().is_empty());
    assert!(rig.sink.notes().is_empty());
    assert!(rig.take_timer_ops().is_empty());
}

// ── Suspend / resume ──────────────────────────────────────────

#[test]
fn suspend_drops_bias_for_three_pole_headset() {
    let mut rig = Rig::new();
    rig.board.insert_headset_without_mic();
    rig.fire(IrqSource::Hs).unwrap();
    assert!(!rig.headset.detect_low_power());

    rig.headset.suspend().unwrap();
    assert!(rig.headset.detect_low_power());
    assert_eq!(rig.headset.accessory(), AccessoryState::HeadsetWithoutMic);

    rig.headset.resume().unwrap();
    assert!(!rig.headset.detect_low_power());
}

#[test]
fn suspend_keeps_bias_for_mic_headset() {
    let mut rig = Rig::with_mic_headset();
    let modes = rig.board.regulator_modes();

    rig.headset.suspend().unwrap();
    rig.headset.resume().unwrap();

    assert!(!rig.headset.detect_low_power());
    assert_eq!(rig.board.regulator_modes(), modes);
}

// ── Detach ────────────────────────────────────────────────────

#[test]
fn detach_cancels_work_and_frees_every_source() {
    let mut rig = Rig::attach(SimBoard::new(), st_config()).unwrap();
    rig.board.insert_headset_with_mic();
    rig.fire(IrqSource::Hs).unwrap();
    rig.board.take_calls();
    rig.take_timer_ops();

    let Rig {
        board, ops, headset, ..
    } = rig;
    let timers = headset.detach();

    assert_eq!(
        *ops.lock().unwrap(),
        vec![TimerOp::Cancel(ReArm::Macro), TimerOp::Cancel(ReArm::Mb2)]
    );
    assert_eq!(
        frees(&board.calls()),
        vec![IrqSource::Mb2, IrqSource::Hs, IrqSource::Macro]
    );
    // The pending MB2 re-arm never runs.
    assert_eq!(timers.advance(Duration::from_millis(500)), 0);
    assert!(board.is_masked(IrqSource::Mb2));
}

//! Accessory detection: insertion, removal, classification and recovery.

use std::time::Duration;

use jackdetect::adapters::sim::SimBoard;
use jackdetect::app::ports::{
    Diagnostic, IrqSource, RegisterTarget, RegulatorMode, SenseLine,
};
use jackdetect::config::JackConfig;
use jackdetect::fsm::AccessoryState;
use jackdetect::regs;
use jackdetect::scheduler::{ReArm, ReArmState};
use jackdetect::{BusError, Error};

use crate::mock_hw::{Rig, TimerOp};

const REARM: Duration = Duration::from_millis(200);

#[test]
fn attach_on_empty_jack_reports_no_device() {
    let rig = Rig::new();

    assert_eq!(rig.headset.accessory(), AccessoryState::NoDevice);
    assert_eq!(rig.sink.states(), vec![AccessoryState::NoDevice]);
    assert!(rig.headset.detect_low_power());
    // Flag starts set, so nothing is written to the regulator.
    assert!(rig.board.regulator_modes().is_empty());
    assert!(rig.delay.waits_ms().is_empty());
    assert!(rig.board.is_masked(IrqSource::Mb2));
    assert!(!rig.board.is_masked(IrqSource::Hs));
}

#[test]
fn headset_with_mic_is_classified_after_settle() {
    let mut rig = Rig::new();
    rig.take_timer_ops();

    rig.board.insert_headset_with_mic();
    assert!(rig.fire(IrqSource::Hs).unwrap());

    assert_eq!(rig.headset.accessory(), AccessoryState::HeadsetWithMic);
    assert_eq!(rig.delay.waits_ms(), vec![11]);
    assert_eq!(rig.board.regulator_modes(), vec![RegulatorMode::Normal]);
    assert!(!rig.headset.detect_low_power());
    assert_eq!(
        rig.take_timer_ops(),
        vec![
            TimerOp::Cancel(ReArm::Mb2),
            TimerOp::Schedule(ReArm::Mb2, REARM)
        ]
    );
    assert_eq!(
        rig.board.register(RegisterTarget::TransmitInput),
        regs::TXI_MB_ON2 | regs::TXI_PTT_CMP_EN
    );
    assert_eq!(
        rig.board.register(RegisterTarget::OutputBias),
        regs::RXOA_ST_HS_CP_EN
    );
}

#[test]
fn button_source_is_rearmed_after_window() {
    let mut rig = Rig::new();
    rig.board.insert_headset_with_mic();
    rig.fire(IrqSource::Hs).unwrap();

    assert!(rig.board.is_masked(IrqSource::Mb2));
    assert_eq!(rig.advance_ms(199), 0);
    assert!(rig.board.is_masked(IrqSource::Mb2));

    let clears = rig.board.clear_count(IrqSource::Mb2);
    assert_eq!(rig.advance_ms(1), 1);
    assert!(!rig.board.is_masked(IrqSource::Mb2));
    assert_eq!(rig.board.clear_count(IrqSource::Mb2), clears + 1);
    assert_eq!(rig.headset.timers().state(ReArm::Mb2), ReArmState::Fired);
}

#[test]
fn three_pole_headset_is_without_mic() {
    let mut rig = Rig::new();
    rig.take_timer_ops();

    rig.board.insert_headset_without_mic();
    rig.fire(IrqSource::Hs).unwrap();

    assert_eq!(rig.headset.accessory(), AccessoryState::HeadsetWithoutMic);
    assert!(rig.sink.diagnostics().is_empty());
    assert!(
        rig.take_timer_ops()
            .contains(&TimerOp::Schedule(ReArm::Mb2, REARM))
    );
}

#[test]
fn unsupported_headset_reports_diagnostic_and_keeps_button_masked() {
    let mut rig = Rig::new();
    rig.take_timer_ops();

    rig.board.insert_unsupported_headset();
    rig.fire(IrqSource::Hs).unwrap();

    assert_eq!(rig.headset.accessory(), AccessoryState::HeadsetWithoutMic);
    assert_eq!(
        rig.sink.diagnostics(),
        vec![Diagnostic::UnsupportedMicOrKeys]
    );
    assert_eq!(rig.take_timer_ops(), vec![TimerOp::Cancel(ReArm::Mb2)]);

    rig.advance_ms(1000);
    assert!(rig.board.is_masked(IrqSource::Mb2));
}

#[test]
fn removal_returns_to_low_power() {
    let mut rig = Rig::with_mic_headset();

    rig.board.unplug();
    rig.fire(IrqSource::Hs).unwrap();

    assert_eq!(rig.headset.accessory(), AccessoryState::NoDevice);
    assert!(rig.headset.detect_low_power());
    assert_eq!(
        rig.board.regulator_modes(),
        vec![RegulatorMode::Normal, RegulatorMode::Standby]
    );
    assert_eq!(rig.board.register(RegisterTarget::TransmitInput), 0);
    assert_eq!(rig.board.register(RegisterTarget::OutputBias), 0);
    assert!(rig.board.is_masked(IrqSource::Mb2));
}

#[test]
fn removal_during_rearm_window_cancels_pending_rearm() {
    let mut rig = Rig::new();
    rig.board.insert_headset_with_mic();
    rig.fire(IrqSource::Hs).unwrap();
    assert_eq!(rig.headset.timers().state(ReArm::Mb2), ReArmState::Scheduled);
    rig.take_timer_ops();

    rig.board.unplug();
    rig.fire(IrqSource::Hs).unwrap();

    assert_eq!(rig.take_timer_ops(), vec![TimerOp::Cancel(ReArm::Mb2)]);
    assert_eq!(rig.headset.timers().state(ReArm::Mb2), ReArmState::Cancelled);
    assert_eq!(rig.advance_ms(500), 0);
    assert!(rig.board.is_masked(IrqSource::Mb2));
}

#[test]
fn identical_states_are_notified_again() {
    let mut rig = Rig::with_mic_headset();

    rig.fire(IrqSource::Hs).unwrap();
    rig.fire(IrqSource::Hs).unwrap();

    assert_eq!(
        rig.sink.states(),
        vec![AccessoryState::HeadsetWithMic, AccessoryState::HeadsetWithMic]
    );
}

#[test]
fn custom_timing_is_honoured() {
    let config = JackConfig {
        settle_ms: 25,
        mb2_rearm_ms: 50,
        ..JackConfig::default()
    };
    let board = SimBoard::new();
    board.insert_headset_with_mic();
    let rig = Rig::attach(board, config).unwrap();

    assert_eq!(rig.delay.waits_ms(), vec![25]);
    assert_eq!(rig.advance_ms(50), 1);
    assert!(!rig.board.is_masked(IrqSource::Mb2));
}

#[test]
fn transport_failure_rolls_back_to_no_device() {
    let mut rig = Rig::new();
    rig.take_timer_ops();
    rig.board.fail_sense(Some(SenseLine::Ptt));

    rig.board.insert_headset_with_mic();
    let err = rig.fire(IrqSource::Hs).unwrap_err();

    assert_eq!(err, Error::Bus(BusError::Sense(SenseLine::Ptt)));
    assert_eq!(rig.headset.accessory(), AccessoryState::NoDevice);
    assert!(rig.headset.detect_low_power());
    assert!(rig.headset.macro_low_power());
    assert_eq!(
        rig.board.regulator_modes(),
        vec![RegulatorMode::Normal, RegulatorMode::Standby]
    );
    assert_eq!(
        rig.take_timer_ops(),
        vec![
            TimerOp::Cancel(ReArm::Mb2),
            TimerOp::Cancel(ReArm::Mb2),
            TimerOp::Cancel(ReArm::Macro),
        ]
    );

    // The next HS event after the fault clears is handled normally.
    rig.board.fail_sense(None);
    assert!(rig.fire(IrqSource::Hs).unwrap());
    assert_eq!(rig.headset.accessory(), AccessoryState::HeadsetWithMic);
}

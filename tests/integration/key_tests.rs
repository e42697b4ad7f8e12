//! Media key debouncing and button-interrupt redirection.

use jackdetect::app::ports::{IrqSource, SenseLevel, SenseLine};
use jackdetect::drivers::media_key::KeyState;
use jackdetect::fsm::AccessoryState;

use crate::mock_hw::{Note, Rig};

#[test]
fn press_then_release_emits_two_edges() {
    let mut rig = Rig::with_mic_headset();

    rig.board.press();
    assert!(rig.fire(IrqSource::Mb2).unwrap());
    assert_eq!(rig.headset.key_state(), KeyState::Pressed);
    // The handler re-enables the source for the release edge.
    assert!(!rig.board.is_masked(IrqSource::Mb2));

    rig.board.release();
    assert!(rig.fire(IrqSource::Mb2).unwrap());

    assert_eq!(rig.sink.keys(), vec![KeyState::Pressed, KeyState::Released]);
    assert_eq!(rig.headset.key_state(), KeyState::Released);
}

#[test]
fn short_tap_is_recovered_as_a_pulse() {
    let mut rig = Rig::with_mic_headset();

    rig.board.press();
    rig.board.release();
    rig.fire(IrqSource::Mb2).unwrap();

    assert_eq!(rig.sink.keys(), vec![KeyState::Pressed, KeyState::Released]);
    assert_eq!(rig.headset.key_state(), KeyState::Released);
}

#[test]
fn held_button_is_reported_once() {
    let mut rig = Rig::with_mic_headset();

    rig.board.press();
    rig.fire(IrqSource::Mb2).unwrap();
    rig.fire(IrqSource::Mb2).unwrap();

    assert_eq!(rig.sink.keys(), vec![KeyState::Pressed]);
}

#[test]
fn ptt_alone_counts_as_pressed() {
    let mut rig = Rig::with_mic_headset();

    rig.board.set_line(SenseLine::Ptt, SenseLevel::Deasserted);
    rig.fire(IrqSource::Mb2).unwrap();

    assert_eq!(rig.sink.keys(), vec![KeyState::Pressed]);
}

#[test]
fn button_events_do_not_touch_accessory_state() {
    let mut rig = Rig::with_mic_headset();

    rig.board.press();
    rig.fire(IrqSource::Mb2).unwrap();

    assert!(rig.sink.states().is_empty());
    // Only the attach-time settle.
    assert_eq!(rig.delay.waits_ms(), vec![11]);
}

#[test]
fn button_source_is_masked_during_settle_window() {
    let mut rig = Rig::new();
    rig.board.insert_headset_with_mic();
    rig.fire(IrqSource::Hs).unwrap();

    rig.board.press();
    assert!(!rig.fire(IrqSource::Mb2).unwrap());
    assert!(rig.sink.keys().is_empty());
}

#[test]
fn button_event_after_unplug_runs_removal() {
    let mut rig = Rig::with_mic_headset();
    rig.board.press();
    rig.fire(IrqSource::Mb2).unwrap();
    rig.sink.take();

    // Removal noise reaches MB2 before HS.
    rig.board.unplug();
    rig.fire(IrqSource::Mb2).unwrap();

    assert_eq!(
        rig.sink.take(),
        vec![
            Note::Key(KeyState::Released),
            Note::State(AccessoryState::NoDevice),
        ]
    );
    assert_eq!(rig.headset.accessory(), AccessoryState::NoDevice);
    assert!(rig.board.is_masked(IrqSource::Mb2));
}

#[test]
fn button_event_without_mic_reclassifies() {
    let mut rig = Rig::new();
    rig.board.insert_headset_without_mic();
    rig.fire(IrqSource::Hs).unwrap();
    rig.advance_ms(200);
    rig.sink.take();

    rig.fire(IrqSource::Mb2).unwrap();

    assert_eq!(
        rig.sink.take(),
        vec![Note::State(AccessoryState::HeadsetWithoutMic)]
    );
    assert!(rig.sink.keys().is_empty());
    assert_eq!(rig.delay.waits_ms(), vec![11, 11]);
}

//! Fuzz target: `Headset` interrupt and sense-line sequences
//!
//! Each input byte is one step: the low three bits pick an action, the
//! rest parameterise it.  Transport faults are injected too, so rollback
//! runs alongside normal detection.  After every step the driver must hold
//! its invariants:
//!
//! - a delivered HS event leaves `NoDevice` exactly when HS read absent
//! - `NoDevice` implies the key is released
//! - `NoDevice` implies the detect flag is in low power, unless a
//!   regulator fault kept the flag from moving
//!
//! cargo fuzz run fuzz_irq_sequence

#![no_main]

use embedded_hal::delay::DelayNs;
use jackdetect::adapters::sim::SimBoard;
use jackdetect::app::ports::{IrqSource, NotificationSink, SenseLevel, SenseLine};
use jackdetect::config::{JackConfig, PmicVendor};
use jackdetect::drivers::media_key::KeyState;
use jackdetect::fsm::AccessoryState;
use jackdetect::scheduler::TickTimers;
use jackdetect::Headset;
use libfuzzer_sys::fuzz_target;

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

struct Discard;

impl NotificationSink for Discard {
    fn notify_state(&mut self, _state: AccessoryState) {}
    fn notify_key(&mut self, _key: KeyState) {}
}

fn level(bit: u8) -> SenseLevel {
    SenseLevel::from_bit(bit & 1 == 1)
}

fuzz_target!(|data: &[u8]| {
    let Some((&first, steps)) = data.split_first() else {
        return;
    };

    let board = SimBoard::new();
    let config = JackConfig {
        vendor: if first & 1 == 1 { PmicVendor::St } else { PmicVendor::Ti },
        ..JackConfig::default()
    };
    let Ok(mut headset) = Headset::attach(
        board.pmic(),
        Some(board.regulator()),
        Discard,
        NoDelay,
        config,
        |body| Ok(TickTimers::new(body)),
    ) else {
        return;
    };

    let mut regulator_faulted = false;

    for &byte in steps {
        let arg = byte >> 3;
        let mut hs_delivered = None;

        match byte & 0x07 {
            0 => board.set_line(SenseLine::Hs, level(arg)),
            1 => board.set_line(SenseLine::Mb2, level(arg)),
            2 => board.set_line(SenseLine::Ptt, level(arg)),
            3 => {
                let absent = board.level(SenseLine::Hs) == SenseLevel::Asserted;
                if let Some(line) = board.fire(IrqSource::Hs) {
                    if headset.handle_irq(line).is_ok() {
                        hs_delivered = Some(absent);
                    }
                }
            }
            4 => {
                if let Some(line) = board.fire(IrqSource::Mb2) {
                    let _ = headset.handle_irq(line);
                }
            }
            5 => {
                if let Some(line) = board.fire(IrqSource::Macro) {
                    let _ = headset.handle_irq(line);
                }
            }
            6 => {
                headset
                    .timers()
                    .advance(core::time::Duration::from_millis(u64::from(arg) * 16));
            }
            _ => match arg & 0x03 {
                0 => board.fail_sense(None),
                1 => board.fail_sense(Some(SenseLine::Ptt)),
                2 => {
                    let fail = arg & 0x04 != 0;
                    regulator_faulted |= fail;
                    board.fail_regulator(fail);
                }
                _ => {
                    let _ = headset.handle_irq(u16::from(arg));
                }
            },
        }

        let state = headset.accessory();
        if let Some(absent) = hs_delivered {
            assert_eq!(state == AccessoryState::NoDevice, absent);
        }
        if state == AccessoryState::NoDevice {
            assert_eq!(headset.key_state(), KeyState::Released);
            assert!(headset.detect_low_power() || regulator_faulted);
        }
    }

    drop(headset.detach());
});

//! Simulated PMIC + regulator for host builds.
//!
//! One [`SimBoard`] holds the electrical state (sense lines, interrupt
//! masks, register bits, regulator mode) behind a shared lock and hands out
//! [`SimPmic`] / [`SimRegulator`] ports that record every access into a
//! single ordered call log.  The board side can flip sense lines and
//! deliver interrupts the way the PMIC interrupt thread does: a masked or
//! unclaimed source is never delivered, and delivery masks the source until
//! a handler unmasks it again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::ports::{
    IrqSource, PmicPort, RegisterTarget, RegulatorMode, RegulatorPort, SenseLevel, SenseLine,
};
use crate::error::BusError;

/// One recorded port access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCall {
    ReadSense(SenseLine),
    WriteRegister {
        target: RegisterTarget,
        mask: u16,
        value: u16,
    },
    Mask(IrqSource),
    Unmask(IrqSource),
    Clear(IrqSource),
    Register(IrqSource),
    Free(IrqSource),
    StartMacro,
    Delivered(IrqSource),
    SetMode(RegulatorMode),
    SetVoltage(u32, u32),
}

#[derive(Debug, Clone, Copy, Default)]
struct IrqLine {
    registered: bool,
    masked: bool,
    clears: u32,
}

#[derive(Debug)]
struct SimState {
    hs: SenseLevel,
    mb2: SenseLevel,
    ptt: SenseLevel,
    irqs: [IrqLine; 3],
    txi: u16,
    rxoa: u16,
    mode: Option<RegulatorMode>,
    voltage: Option<(u32, u32)>,
    macro_started: bool,
    fail_sense: Option<SenseLine>,
    fail_register: Option<IrqSource>,
    fail_regulator: bool,
    calls: Vec<SimCall>,
}

fn irq_index(src: IrqSource) -> usize {
    match src {
        IrqSource::Hs => 0,
        IrqSource::Mb2 => 1,
        IrqSource::Macro => 2,
    }
}

/// Shared handle to the simulated board.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct SimBoard {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Empty jack, all sources unclaimed.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                hs: SenseLevel::Asserted,
                mb2: SenseLevel::Asserted,
                ptt: SenseLevel::Asserted,
                irqs: [IrqLine::default(); 3],
                txi: 0,
                rxoa: 0,
                mode: None,
                voltage: None,
                macro_started: false,
                fail_sense: None,
                fail_register: None,
                fail_regulator: false,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// PMIC port bound to this board.
    pub fn pmic(&self) -> SimPmic {
        SimPmic {
            board: self.clone(),
        }
    }

    /// Regulator port bound to this board.
    pub fn regulator(&self) -> SimRegulator {
        SimRegulator {
            board: self.clone(),
        }
    }

    // ── Electrical scenarios ──────────────────────────────────

    pub fn set_line(&self, line: SenseLine, level: SenseLevel) {
        let mut s = self.lock();
        match line {
            SenseLine::Hs => s.hs = level,
            SenseLine::Mb2 => s.mb2 = level,
            SenseLine::Ptt => s.ptt = level,
        }
    }

    fn set_lines(&self, hs: SenseLevel, mb2: SenseLevel, ptt: SenseLevel) {
        let mut s = self.lock();
        s.hs = hs;
        s.mb2 = mb2;
        s.ptt = ptt;
    }

    pub fn unplug(&self) {
        use SenseLevel::Asserted;
        self.set_lines(Asserted, Asserted, Asserted);
    }

    pub fn insert_headset_with_mic(&self) {
        use SenseLevel::{Asserted, Deasserted};
        self.set_lines(Deasserted, Asserted, Asserted);
    }

    /// Three-pole plug: PTT shorted to ground.
    pub fn insert_headset_without_mic(&self) {
        use SenseLevel::Deasserted;
        self.set_lines(Deasserted, Deasserted, Deasserted);
    }

    /// Mic/keys wired in a way the comparator cannot read.
    pub fn insert_unsupported_headset(&self) {
        use SenseLevel::{Asserted, Deasserted};
        self.set_lines(Deasserted, Deasserted, Asserted);
    }

    /// Hold the media button (pulls MB2 and PTT low).
    pub fn press(&self) {
        let mut s = self.lock();
        s.mb2 = SenseLevel::Deasserted;
        s.ptt = SenseLevel::Deasserted;
    }

    pub fn release(&self) {
        let mut s = self.lock();
        s.mb2 = SenseLevel::Asserted;
        s.ptt = SenseLevel::Asserted;
    }

    // ── Interrupt delivery ────────────────────────────────────

    /// Latch an event on `src`.  Returns the raw line number to hand to the
    /// dispatcher, or `None` if the source is masked or unclaimed.
    pub fn fire(&self, src: IrqSource) -> Option<u16> {
        let mut s = self.lock();
        let line = &mut s.irqs[irq_index(src)];
        if !line.registered || line.masked {
            return None;
        }
        line.masked = true;
        s.calls.push(SimCall::Delivered(src));
        Some(src.raw())
    }

    // ── Fault injection ───────────────────────────────────────

    /// Every read of `line` fails until cleared with `None`.
    pub fn fail_sense(&self, line: Option<SenseLine>) {
        self.lock().fail_sense = line;
    }

    /// Registration of `src` fails.
    pub fn fail_register(&self, src: Option<IrqSource>) {
        self.lock().fail_register = src;
    }

    /// Every regulator access fails.
    pub fn fail_regulator(&self, fail: bool) {
        self.lock().fail_regulator = fail;
    }

    // ── Inspection ────────────────────────────────────────────

    /// Electrical level of `line`, bypassing the call log.
    pub fn level(&self, line: SenseLine) -> SenseLevel {
        let s = self.lock();
        match line {
            SenseLine::Hs => s.hs,
            SenseLine::Mb2 => s.mb2,
            SenseLine::Ptt => s.ptt,
        }
    }

    pub fn is_masked(&self, src: IrqSource) -> bool {
        self.lock().irqs[irq_index(src)].masked
    }

    pub fn is_registered(&self, src: IrqSource) -> bool {
        self.lock().irqs[irq_index(src)].registered
    }

    pub fn clear_count(&self, src: IrqSource) -> u32 {
        self.lock().irqs[irq_index(src)].clears
    }

    pub fn register(&self, target: RegisterTarget) -> u16 {
        let s = self.lock();
        match target {
            RegisterTarget::TransmitInput => s.txi,
            RegisterTarget::OutputBias => s.rxoa,
        }
    }

    pub fn regulator_mode(&self) -> Option<RegulatorMode> {
        self.lock().mode
    }

    pub fn regulator_voltage(&self) -> Option<(u32, u32)> {
        self.lock().voltage
    }

    pub fn macro_started(&self) -> bool {
        self.lock().macro_started
    }

    /// Every regulator mode change so far, in order.
    pub fn regulator_modes(&self) -> Vec<RegulatorMode> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                SimCall::SetMode(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<SimCall> {
        self.lock().calls.clone()
    }

    /// Drain the call log.
    pub fn take_calls(&self) -> Vec<SimCall> {
        std::mem::take(&mut self.lock().calls)
    }
}

// ── PmicPort ──────────────────────────────────────────────────

/// PMIC side of a [`SimBoard`].
#[derive(Debug, Clone)]
pub struct SimPmic {
    board: SimBoard,
}

impl PmicPort for SimPmic {
    fn read_sense(&mut self, line: SenseLine) -> Result<SenseLevel, BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::ReadSense(line));
        if s.fail_sense == Some(line) {
            return Err(BusError::Sense(line));
        }
        Ok(match line {
            SenseLine::Hs => s.hs,
            SenseLine::Mb2 => s.mb2,
            SenseLine::Ptt => s.ptt,
        })
    }

    fn write_register(
        &mut self,
        target: RegisterTarget,
        mask: u16,
        value: u16,
    ) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::WriteRegister {
            target,
            mask,
            value,
        });
        let reg = match target {
            RegisterTarget::TransmitInput => &mut s.txi,
            RegisterTarget::OutputBias => &mut s.rxoa,
        };
        *reg = (*reg & !mask) | (value & mask);
        Ok(())
    }

    fn mask_irq(&mut self, src: IrqSource) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::Mask(src));
        s.irqs[irq_index(src)].masked = true;
        Ok(())
    }

    fn unmask_irq(&mut self, src: IrqSource) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::Unmask(src));
        s.irqs[irq_index(src)].masked = false;
        Ok(())
    }

    fn clear_irq(&mut self, src: IrqSource) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::Clear(src));
        s.irqs[irq_index(src)].clears += 1;
        Ok(())
    }

    fn register_irq(&mut self, src: IrqSource) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::Register(src));
        if s.fail_register == Some(src) {
            return Err(BusError::Irq(src));
        }
        s.irqs[irq_index(src)] = IrqLine {
            registered: true,
            ..IrqLine::default()
        };
        Ok(())
    }

    fn free_irq(&mut self, src: IrqSource) {
        let mut s = self.board.lock();
        s.calls.push(SimCall::Free(src));
        s.irqs[irq_index(src)].registered = false;
    }

    fn start_detect_macro(&mut self) -> Result<(), BusError> {
        let mut s = self.board.lock();
        s.calls.push(SimCall::StartMacro);
        s.macro_started = true;
        Ok(())
    }
}

// ── RegulatorPort ─────────────────────────────────────────────

/// Regulator side of a [`SimBoard`].
#[derive(Debug, Clone)]
pub struct SimRegulator {
    board: SimBoard,
}

impl RegulatorPort for SimRegulator {
    fn set_mode(&mut self, mode: RegulatorMode) -> Result<(), BusError> {
        let mut s = self.board.lock();
        if s.fail_regulator {
            return Err(BusError::Regulator);
        }
        s.calls.push(SimCall::SetMode(mode));
        s.mode = Some(mode);
        Ok(())
    }

    fn set_voltage(&mut self, min_uv: u32, max_uv: u32) -> Result<(), BusError> {
        let mut s = self.board.lock();
        if s.fail_regulator {
            return Err(BusError::Regulator);
        }
        s.calls.push(SimCall::SetVoltage(min_uv, max_uv));
        s.voltage = Some((min_uv, max_uv));
        Ok(())
    }
}

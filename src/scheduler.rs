//! Deferred re-arm scheduler.
//!
//! Two independent one-shot actions, identified by purpose, absorb the
//! electrical noise that follows a state change by keeping an interrupt
//! source masked for a while:
//!
//! | Action        | Body                                             |
//! |---------------|--------------------------------------------------|
//! | `ReArm::Mb2`  | clear + unmask the MB2 source                    |
//! | `ReArm::Macro`| set the macro low-power flag, unmask the macro   |
//!
//! Bodies are owned by the [`Headset`](crate::app::service::Headset) and
//! handed to the backend once, when the backend is built.  Two backends
//! implement [`DeferredWork`]:
//!
//! - [`TimerWorker`] — dedicated thread, wall-clock deadlines.
//! - [`TickTimers`] — virtual clock advanced by the owner's control loop.
//!
//! ```text
//!            schedule()              deadline
//!   Idle ───────────────▶ Scheduled ─────────▶ Running ──▶ Fired
//!                             │                   │
//!                  cancel_sync()        cancel_sync() blocks
//!                             ▼                   ▼  until done
//!                         Cancelled             Fired
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::debug;

use crate::app::ports::DeferredWork;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Action identity
// ═══════════════════════════════════════════════════════════════

/// The two deferred re-arm actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReArm {
    /// Re-enable the button interrupt after classification.
    Mb2,
    /// Re-enable the vendor macro interrupt and drop the bias again.
    Macro,
}

impl ReArm {
    pub const ALL: [ReArm; 2] = [ReArm::Mb2, ReArm::Macro];

    fn index(self) -> usize {
        match self {
            Self::Mb2 => 0,
            Self::Macro => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mb2 => "mb2-rearm",
            Self::Macro => "macro-rearm",
        }
    }
}

/// Lifecycle of one action as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReArmState {
    /// Never scheduled.
    Idle,
    /// Waiting for its deadline.
    Scheduled,
    /// Body executing right now.
    Running,
    /// Body ran to completion.
    Fired,
    /// Dropped by `cancel_sync` before it started.
    Cancelled,
}

/// Callback that executes the body of a re-arm action.
pub type ReArmBody = Arc<dyn Fn(ReArm) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════
//  Shared slot table
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Pending-run lifecycle; `Running` is derived from `running`.
    state: ReArmState,
    running: bool,
    deadline: Duration,
}

struct Table {
    slots: [Slot; 2],
    shutdown: bool,
}

/// Slot bookkeeping shared by both backends.  Deadlines are offsets on the
/// backend's own clock.
struct SlotTable {
    table: Mutex<Table>,
    changed: Condvar,
}

impl SlotTable {
    fn new() -> Self {
        let idle = Slot {
            state: ReArmState::Idle,
            running: false,
            deadline: Duration::ZERO,
        };
        Self {
            table: Mutex::new(Table {
                slots: [idle; 2],
                shutdown: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(&self, work: ReArm, deadline: Duration) {
        let mut table = self.lock();
        let slot = &mut table.slots[work.index()];
        // A body already in flight completes; a fresh run follows it.
        slot.state = ReArmState::Scheduled;
        slot.deadline = deadline;
        drop(table);
        self.changed.notify_all();
    }

    /// Must not be called from inside a body: it would wait on itself.
    fn cancel_sync(&self, work: ReArm) -> bool {
        let mut table = self.lock();
        let slot = &mut table.slots[work.index()];
        let dropped = slot.state == ReArmState::Scheduled;
        if dropped {
            slot.state = ReArmState::Cancelled;
        }
        while table.slots[work.index()].running {
            table = self
                .changed
                .wait(table)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(table);
        if dropped {
            self.changed.notify_all();
        }
        dropped
    }

    fn state(&self, work: ReArm) -> ReArmState {
        let slot = self.lock().slots[work.index()];
        if slot.running && slot.state != ReArmState::Scheduled {
            ReArmState::Running
        } else {
            slot.state
        }
    }

    /// Claim the earliest due action, marking it running.
    fn take_due(table: &mut Table, now: Duration) -> Option<ReArm> {
        let work = ReArm::ALL
            .into_iter()
            .filter(|w| {
                let slot = table.slots[w.index()];
                slot.state == ReArmState::Scheduled && !slot.running && slot.deadline <= now
            })
            .min_by_key(|w| table.slots[w.index()].deadline)?;
        let slot = &mut table.slots[work.index()];
        slot.state = ReArmState::Fired;
        slot.running = true;
        Some(work)
    }

    fn next_deadline(table: &Table) -> Option<Duration> {
        table
            .slots
            .iter()
            .filter(|s| s.state == ReArmState::Scheduled)
            .map(|s| s.deadline)
            .min()
    }

    fn finish(&self, work: ReArm) {
        self.lock().slots[work.index()].running = false;
        self.changed.notify_all();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tick-driven backend
// ═══════════════════════════════════════════════════════════════

/// Virtual-clock backend.  The owner calls [`advance`](Self::advance) from
/// its control loop; due bodies run on the caller's thread.
pub struct TickTimers {
    table: SlotTable,
    now: Mutex<Duration>,
    body: ReArmBody,
}

impl TickTimers {
    pub fn new(body: ReArmBody) -> Self {
        Self {
            table: SlotTable::new(),
            now: Mutex::new(Duration::ZERO),
            body,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward by `dt` and run every action that came due,
    /// earliest first.  Returns the number of bodies executed.
    pub fn advance(&self, dt: Duration) -> usize {
        let now = {
            let mut clock = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *clock += dt;
            *clock
        };

        let mut ran = 0;
        loop {
            let due = {
                let mut table = self.table.lock();
                SlotTable::take_due(&mut table, now)
            };
            let Some(work) = due else { break };
            debug!("TickTimers: {} fired at {:?}", work.label(), now);
            (self.body)(work);
            self.table.finish(work);
            ran += 1;
        }
        ran
    }

    /// Time until the next pending action, if any.
    pub fn next_due_in(&self) -> Option<Duration> {
        let now = self.now();
        SlotTable::next_deadline(&self.table.lock()).map(|d| d.saturating_sub(now))
    }
}

impl DeferredWork for TickTimers {
    fn schedule(&self, work: ReArm, delay: Duration) {
        let deadline = self.now() + delay;
        debug!("TickTimers: {} scheduled in {:?}", work.label(), delay);
        self.table.schedule(work, deadline);
    }

    fn cancel_sync(&self, work: ReArm) -> bool {
        self.table.cancel_sync(work)
    }

    fn state(&self, work: ReArm) -> ReArmState {
        self.table.state(work)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Threaded backend
// ═══════════════════════════════════════════════════════════════

/// Wall-clock backend running bodies on a dedicated `jack-rearm` thread.
///
/// Dropping the worker stops the thread; pending actions are discarded.
pub struct TimerWorker {
    table: Arc<SlotTable>,
    epoch: Instant,
    thread: Option<JoinHandle<()>>,
}

impl TimerWorker {
    /// Start the worker thread.
    pub fn spawn(body: ReArmBody) -> Result<Self> {
        let table = Arc::new(SlotTable::new());
        let epoch = Instant::now();
        let worker_table = Arc::clone(&table);

        let thread = std::thread::Builder::new()
            .name("jack-rearm".into())
            .spawn(move || run_worker(&worker_table, epoch, &body))
            .map_err(|_| Error::Worker("could not spawn re-arm thread"))?;

        debug!("TimerWorker: started");
        Ok(Self {
            table,
            epoch,
            thread: Some(thread),
        })
    }
}

fn run_worker(table: &SlotTable, epoch: Instant, body: &ReArmBody) {
    let mut guard = table.lock();
    loop {
        if guard.shutdown {
            return;
        }

        let now = epoch.elapsed();
        if let Some(work) = SlotTable::take_due(&mut guard, now) {
            drop(guard);
            debug!("TimerWorker: {} fired", work.label());
            body(work);
            table.finish(work);
            guard = table.lock();
            continue;
        }

        guard = match SlotTable::next_deadline(&guard) {
            Some(deadline) => {
                table
                    .changed
                    .wait_timeout(guard, deadline.saturating_sub(now))
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => table
                .changed
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner),
        };
    }
}

impl DeferredWork for TimerWorker {
    fn schedule(&self, work: ReArm, delay: Duration) {
        debug!("TimerWorker: {} scheduled in {:?}", work.label(), delay);
        self.table.schedule(work, self.epoch.elapsed() + delay);
    }

    fn cancel_sync(&self, work: ReArm) -> bool {
        self.table.cancel_sync(work)
    }

    fn state(&self, work: ReArm) -> ReArmState {
        self.table.state(work)
    }
}

impl Drop for TimerWorker {
    fn drop(&mut self) {
        self.table.lock().shutdown = true;
        self.table.changed.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

//! jack-sim — scripted headset session against the simulated PMIC.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  SimBoard (sense lines, IRQ masks, regulator)           │
//! │      │ fire()                                           │
//! │      ▼                                                  │
//! │  Headset ── TimerWorker ("jack-rearm" thread)           │
//! │      │                                                  │
//! │      ▼                                                  │
//! │  LogSink ──▶ SwitchDevice ──▶ SwitchHandle (this loop)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `jack-sim [config.json]`
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use jackdetect::adapters::log_sink::LogSink;
use jackdetect::adapters::sim::SimBoard;
use jackdetect::adapters::switch::{EVENT_DEPTH, SwitchDevice, SwitchHandle};
use jackdetect::app::ports::{IrqSource, NotificationSink};
use jackdetect::config::JackConfig;
use jackdetect::drivers::delay::ThreadDelay;
use jackdetect::scheduler::TimerWorker;
use jackdetect::Headset;

type SimHeadset<N> = Headset<
    jackdetect::adapters::sim::SimPmic,
    jackdetect::adapters::sim::SimRegulator,
    N,
    TimerWorker,
    ThreadDelay,
>;

/// Slack on top of the longer re-arm delay before the next scripted step.
const REARM_SLACK: Duration = Duration::from_millis(50);

fn load_config() -> Result<JackConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(JackConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: JackConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    info!("Config loaded from {path}");
    Ok(config)
}

/// Deliver `src` the way the PMIC interrupt thread would.
fn deliver<N>(board: &SimBoard, headset: &mut SimHeadset<N>, src: IrqSource) -> Result<()>
where
    N: NotificationSink + Send + 'static,
{
    match board.fire(src) {
        Some(line) => headset.handle_irq(line).map_err(anyhow::Error::from),
        None => {
            info!("{src} interrupt masked, not delivered");
            Ok(())
        }
    }
}

fn rearm_wait(config: &JackConfig) -> Duration {
    let longest = config.mb2_rearm_ms.max(config.macro_rearm_ms);
    Duration::from_millis(u64::from(longest)) + REARM_SLACK
}

fn report(step: &str, switch: &SwitchHandle) {
    info!("── {step}: switch {} = {}", switch.name(), switch.print_name());
    for event in switch.drain() {
        info!("   event {:?}", event);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("jack-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let board = SimBoard::new();
    let (switch, handle) =
        SwitchDevice::<EVENT_DEPTH>::new(&config.switch_name, config.media_key_code);
    let sink = LogSink::wrap(config.media_key_code, switch);

    let mut headset: SimHeadset<_> = Headset::attach(
        board.pmic(),
        Some(board.regulator()),
        sink,
        ThreadDelay::new(),
        config,
        TimerWorker::spawn,
    )
    .context("attach failed")?;
    report("attach (empty jack)", &handle);
    let wait = rearm_wait(headset.config());

    board.insert_headset_with_mic();
    deliver(&board, &mut headset, IrqSource::Hs)?;
    report("insert headset with mic", &handle);

    // Button interrupts stay masked until the MB2 re-arm fires.
    std::thread::sleep(wait);

    board.press();
    deliver(&board, &mut headset, IrqSource::Mb2)?;
    board.release();
    deliver(&board, &mut headset, IrqSource::Mb2)?;
    report("press and release", &handle);

    // A tap too short for two edges: both changes land before delivery.
    board.press();
    board.release();
    deliver(&board, &mut headset, IrqSource::Mb2)?;
    report("short tap", &handle);

    if headset.config().vendor.has_detect_macro() {
        deliver(&board, &mut headset, IrqSource::Macro)?;
        info!("macro burst: low power = {}", headset.macro_low_power());
        std::thread::sleep(wait);
        info!("after re-arm: low power = {}", headset.macro_low_power());
    }

    board.unplug();
    deliver(&board, &mut headset, IrqSource::Hs)?;
    report("unplug", &handle);

    board.insert_headset_without_mic();
    deliver(&board, &mut headset, IrqSource::Hs)?;
    headset.suspend()?;
    info!("suspended: detect low power = {}", headset.detect_low_power());
    headset.resume()?;
    info!("resumed: detect low power = {}", headset.detect_low_power());
    report("three-pole headset", &handle);

    board.unplug();
    deliver(&board, &mut headset, IrqSource::Hs)?;
    report("unplug", &handle);

    drop(headset.detach());
    info!("regulator modes: {:?}", board.regulator_modes());
    Ok(())
}

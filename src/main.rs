//! motorctl-sim: the full controller running against a simulated motor.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  block_on(executor.run(drive_hardware))                      │
//! │                                                              │
//! │  drive_hardware (stands in for the timer + ready ISRs)       │
//! │    plant.step ─▶ IsrCell::with(Acquisition::pending)         │
//! │                     └─▶ WindowedSink ─put─▶ averages         │
//! │    keypad script ─────────────────────put─▶ targets          │
//! │                                                              │
//! │  control_task (spawned)                                      │
//! │    averages.get().await ─▶ ControlService ─▶ MotorAdapter    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```text
//! RUST_LOG=info cargo run --features sim -- --targets 2400,3200,1200,0
//! RUST_LOG=debug cargo run --features sim -- --strategy fuzzy --load 0.1
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use edge_executor::LocalExecutor;
use log::info;

use motorctl::acquisition::isr_cell::IsrCell;
use motorctl::acquisition::{Acquisition, PendingIrqs, TriggerMode};
use motorctl::adapters::hardware::MotorAdapter;
use motorctl::adapters::log_sink::LogEventSink;
use motorctl::app::service::ControlService;
use motorctl::app::task::control_task;
use motorctl::config::ControllerConfig;
use motorctl::control::StrategyKind;
use motorctl::drivers::motor::MotorDriver;
use motorctl::error::Error;
use motorctl::queue::SampleQueue;
use motorctl::sensors::{RollingAverage, WindowedSink};
use motorctl::sim::{self, BridgeInput, MotorPlant, SharedPlant, SimAdc, SimLine, SimPwm};

/// Window averages buffered between the ISR and the control task.
const AVERAGE_SLOTS: usize = 8;
/// Keypad target FIFO depth.
const TARGET_SLOTS: usize = 4;

type SimAcquisition<'a> = Acquisition<SimAdc, WindowedSink<'a, AVERAGE_SLOTS>>;

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Fuzzy,
    Pid,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Fuzzy => Self::Fuzzy,
            StrategyArg::Pid => Self::Pid,
        }
    }
}

#[derive(Parser)]
#[command(name = "motorctl-sim", about = "Run the speed controller against a simulated DC motor")]
struct Cli {
    /// Controller configuration (JSON); defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured control strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Target speeds (rpm) entered on the keypad, one per step
    #[arg(short, long, value_delimiter = ',', default_values_t = vec![2400u16, 3200, 1200, 0])]
    targets: Vec<u16>,

    /// Simulated seconds per keypad step
    #[arg(long, default_value_t = 2.0)]
    step_seconds: f32,

    /// Constant load torque as a fraction of full drive
    #[arg(long, default_value_t = 0.0)]
    load: f32,

    /// Log telemetry every N control iterations
    #[arg(long, default_value_t = 25)]
    log_every: u32,
}

fn load_config(cli: &Cli) -> Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ControllerConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy.into();
    }
    // The simulated timer drives conversions; the ready "edge" follows
    // one sample period later.
    config.trigger_mode = TriggerMode::TimerDriven;
    config.validate()?;
    Ok(config)
}

/// Play the keypad script while ticking the plant and the acquisition
/// ISRs once per sample period.
async fn drive_hardware(
    acquisition: &IsrCell<SimAcquisition<'_>>,
    plant: &SharedPlant,
    targets: &SampleQueue<u16, TARGET_SLOTS>,
    script: &[u16],
    step_seconds: f32,
    config: &ControllerConfig,
) {
    let dt = config.sample_period_us as f32 * 1e-6;
    let samples_per_step = (step_seconds / dt).round() as u64;
    let window = u64::from(config.window_size);
    let mut converting = false;

    for (step, &target) in script.iter().enumerate() {
        if targets.put(target).is_err() {
            log::warn!("keypad FIFO full, target {} dropped", target);
        }

        for n in 0..samples_per_step {
            plant.borrow_mut().step(dt);
            acquisition.with(|acq| {
                acq.adc_mut().complete();
                acq.pending(PendingIrqs {
                    ready_edge: converting,
                    timer_tick: true,
                });
            });
            converting = true;

            if n % window == window - 1 {
                // Let the control task consume the window just published.
                futures_lite::future::yield_now().await;
            }
        }

        info!(
            "step {} done: target={} rpm, plant at {:.0} rpm",
            step,
            target,
            plant.borrow().speed_rpm()
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    info!("╔══════════════════════════════════════╗");
    info!("║  motorctl-sim v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── Plant and peripherals ─────────────────────────────────
    let plant = sim::shared(MotorPlant::default());
    plant.borrow_mut().set_load(cli.load);

    let motor = MotorDriver::new(
        SimPwm::new(plant.clone()),
        SimLine::new(plant.clone(), BridgeInput::In1),
        SimLine::new(plant.clone(), BridgeInput::In2),
    )
    .map_err(Error::from)?;
    let mut hw = MotorAdapter::new(motor);
    let mut sink = LogEventSink::with_decimation(cli.log_every);

    // ── Interrupt / task boundary ─────────────────────────────
    let averages: SampleQueue<i32, AVERAGE_SLOTS> = SampleQueue::new();
    let targets: SampleQueue<u16, TARGET_SLOTS> = SampleQueue::new();
    let rolling = RollingAverage::new();
    let (accumulator, reader) = rolling
        .split(config.window_size)
        .ok_or_else(|| anyhow!("rolling average already split"))?;

    let acquisition = IsrCell::new();
    acquisition.install(Acquisition::new(
        SimAdc::new(plant.clone(), config.ticks_per_volt),
        WindowedSink::new(accumulator, &averages),
        &config,
    ));

    // ── Control service ───────────────────────────────────────
    let mut service = ControlService::new(config.clone())?;
    service.start(&mut hw, &mut sink)?;

    {
        let executor: LocalExecutor<'_, 4> = LocalExecutor::new();
        executor
            .spawn(control_task(&mut service, &averages, &targets, &mut hw, &mut sink))
            .detach();

        futures_lite::future::block_on(executor.run(drive_hardware(
            &acquisition,
            &plant,
            &targets,
            &cli.targets,
            cli.step_seconds,
            &config,
        )));
    }

    // ── Summary ───────────────────────────────────────────────
    let t = service.telemetry();
    let stats = acquisition.with(|acq| acq.stats()).unwrap_or_default();
    info!(
        "done: {} iterations, {} windows, last average {} mV, plant at {:.0} rpm",
        t.iterations,
        reader.windows(),
        reader.result(),
        plant.borrow().speed_rpm()
    );
    info!(
        "acquisition: conversions={} overruns={} spurious={} dropped={} lost_windows={}",
        stats.conversions,
        stats.overruns,
        stats.spurious_edges,
        stats.dropped,
        averages.lost_count()
    );
    if plant.borrow().shoot_through() {
        return Err(anyhow!("both bridge inputs are high"));
    }
    Ok(())
}

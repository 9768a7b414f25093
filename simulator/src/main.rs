mod noise;
mod scenario;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use scenario::Scenario;
use serde::Serialize;
use shpb_analysis::{Cancellation, Pipeline};
use shpb_common::init_tracer;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, level_filters::LevelFilter};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// JSON scenario file, the built-in scenario is used when omitted
    #[clap(long)]
    scenario: Option<PathBuf>,

    /// Seed for the noise generator, a fresh seed is drawn when omitted
    #[clap(long, env = "SHPB_SEED")]
    seed: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,

    /// Abandon the alignment search after this many milliseconds
    #[clap(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Simulate a test and write the analysis report as JSON
    Analyse {
        #[clap(long)]
        pretty: bool,

        /// File to write the report to, stdout when omitted
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Write the simulated bar signals as JSON
    Traces {
        #[clap(long)]
        pretty: bool,

        /// File to write the traces to, stdout when omitted
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Write the scenario in use as JSON, as a starting point for scenario files
    Scenario,
}

fn write_json<T: Serialize>(value: &T, pretty: bool, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _tracer = init_tracer!(cli.log_level);

    let scenario: Scenario = match &cli.scenario {
        Some(path) => serde_json::from_reader(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        )
        .with_context(|| format!("cannot parse scenario {}", path.display()))?,
        None => Scenario::default(),
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    match &cli.mode {
        Mode::Analyse { pretty, output } => {
            let signals = scenario.bar_signals(&mut rng)?;
            let pipeline = Pipeline::new(scenario.analysis.clone())?;
            let cancellation = match cli.timeout_ms {
                Some(ms) => Cancellation::with_timeout(Duration::from_millis(ms)),
                None => Cancellation::new(),
            };
            let report = pipeline.run(&signals, &cancellation)?;
            info!(
                "Shifts ({}, {}), FBC {:?}",
                report.shift_transmitted,
                report.shift_reflected,
                report.metrics.get("FBC")
            );
            write_json(&report, *pretty, output.as_ref())?;
        }
        Mode::Traces { pretty, output } => {
            write_json(&scenario.traces(&mut rng)?, *pretty, output.as_ref())?;
        }
        Mode::Scenario => {
            write_json(&scenario, true, None)?;
        }
    }
    Ok(())
}

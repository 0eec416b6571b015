use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lark_sci::Station;
use lark_sci::port::SerialChannel;

mod cli;
mod query;
mod setup;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    setup_logging(&args.verbose);

    let channel = SerialChannel::open(&args.ser.dev, args.ser.baud, args.ser.rtscts)
        .with_context(|| format!("opening {}", args.ser.dev))?;
    let mut station = Station::with_config(channel, args.ser.engine_config());

    let res = match args.cmd {
        cli::Cmd::Query(cmd) => query::run(&mut station, cmd),
        cli::Cmd::Setup(cmd) => setup::run(&mut station, cmd),
    };
    station.engine().stats().log();
    res
}

fn setup_logging(verbosity: &Verbosity<InfoLevel>) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

mod args;

use std::{process::ExitCode, time::Duration};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use istatrol::{
    istatrol::{DeviceIdentity, DeviceSession},
    poll::{PollConfig, PollLoop},
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(anyhow::Error::from_boxed)
        .context("failed to initialize logging")?;

    println!("{}", banner());

    let identity = DeviceIdentity::new(args.vendor_id, args.product_id);
    let config = PollConfig {
        interval: Duration::from_secs(args.interval_secs),
        backoff: Duration::from_secs(args.backoff_secs),
    };

    let mut poll = PollLoop::new(DeviceSession::new(identity), config);
    poll.run().await;

    Ok(())
}

fn banner() -> String {
    format!(
        "{} {} - terminal for the ISTAtrol heating valve controller\n\
         Copyright (c) Markus \"Traumflug\" Hitter <mah@jump-ing.de>\n\
         This program comes with ABSOLUTELY NO WARRANTY. It is free software, \
         licensed under {}.\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_LICENSE"),
    )
}

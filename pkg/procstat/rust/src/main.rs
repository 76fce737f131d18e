// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use tokio::signal::unix::{signal, SignalKind};

use dd_procstat::cli::Cli;
use dd_procstat::{JsonLineSink, Procstat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, once) = cli.into_config()?;

    simple_logger::init_with_level(config.log_level())?;

    let interval_secs = config.interval_secs;
    let mut procstat = Procstat::from_config(&config).context("failed to build collector")?;
    let mut sink = JsonLineSink::new(io::stdout());

    info!(
        "monitoring {}={}, sampling every {interval_secs}s",
        procstat.criterion().tag_key(),
        procstat.criterion().tag_value()
    );

    let mut sigterm = signal(SignalKind::terminate()).context("failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to setup SIGINT handler")?;
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed cycle is logged and retried on the next tick;
                // the registry keeps its previous state.
                if let Err(e) = procstat.gather(&mut sink) {
                    error!("sampling cycle failed: {e}");
                } else {
                    info!("sampled {} process(es)", procstat.tracked());
                }

                if once {
                    return Ok(());
                }
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                return Ok(());
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
                return Ok(());
            }
        }
    }
}

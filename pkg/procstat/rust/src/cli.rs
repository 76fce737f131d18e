// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;

/// Monitor per-process cpu, memory, io and descriptor usage.
#[derive(Parser, Debug, Default)]
#[command(name = "dd-procstat", version)]
pub struct Cli {
    /// Path to a YAML config file. Flags below override file values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// PID file to monitor.
    #[arg(long)]
    pub pid_file: Option<PathBuf>,

    /// Executable name pattern (pgrep <exe>).
    #[arg(long)]
    pub exe: Option<String>,

    /// Full command-line pattern (pgrep -f <pattern>).
    #[arg(long)]
    pub pattern: Option<String>,

    /// Owning user name (pgrep -u <user>).
    #[arg(long)]
    pub user: Option<String>,

    /// Override the resolved process name tag.
    #[arg(long)]
    pub process_name: Option<String>,

    /// Field name prefix for every field except pid.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Emit the pid as a tag instead of a field.
    #[arg(long)]
    pub pid_tag: bool,

    /// Seconds between sampling cycles.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Resolve the effective configuration: file values first, command-line
    /// flags on top.
    pub fn into_config(self) -> Result<(Config, bool)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if self.pid_file.is_some() {
            config.pid_file = self.pid_file;
        }
        if self.exe.is_some() {
            config.exe = self.exe;
        }
        if self.pattern.is_some() {
            config.pattern = self.pattern;
        }
        if self.user.is_some() {
            config.user = self.user;
        }
        if self.process_name.is_some() {
            config.process_name = self.process_name;
        }
        if self.prefix.is_some() {
            config.prefix = self.prefix;
        }
        if self.pid_tag {
            config.pid_tag = true;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }

        Ok((config, self.once))
    }
}

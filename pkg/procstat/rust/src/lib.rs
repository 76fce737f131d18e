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

pub mod cli;
mod collector;
pub mod config;
mod errors;
mod pgrep;
mod procfs;
mod registry;
mod sink;
mod snapshot;

#[cfg(test)]
pub(crate) mod test_utils;

/// Process identifier as exposed by the process table. PIDs are recycled by
/// the kernel, so a `Pid` only identifies a process for as long as the
/// registry holds a live handle for it.
pub type Pid = i32;

// Re-export the public API
pub use collector::Procstat;
pub use config::{Config, MatchCriterion};
pub use errors::Error;
pub use pgrep::{Pgrep, PidResolver};
pub use procfs::{
    CpuTimes, CtxSwitches, IoCounters, MemoryInfo, ProcessMetrics, ProcfsProcess, ProcfsSource,
};
pub use registry::{ProcHandle, ProcessSource};
pub use sink::{Accumulator, FieldValue, JsonLineSink};
pub use snapshot::MEASUREMENT;

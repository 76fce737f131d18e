// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Fake metric sources for unit tests.

use std::collections::HashSet;
use std::io;

use crate::procfs::{CpuTimes, CtxSwitches, IoCounters, MemoryInfo, ProcessMetrics};
use crate::registry::ProcessSource;
use crate::{Error, Pid};

fn unavailable() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "unavailable in fake")
}

/// Process metrics with fixed values and per-category failure switches.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMetrics {
    pub fail_name: bool,
    pub fail_threads: bool,
    pub fail_fds: bool,
    pub fail_ctx: bool,
    pub fail_io: bool,
    pub fail_cpu: bool,
    pub fail_memory: bool,
}

impl FakeMetrics {
    pub fn failing_all() -> Self {
        FakeMetrics {
            fail_name: true,
            fail_threads: true,
            fail_fds: true,
            fail_ctx: true,
            fail_io: true,
            fail_cpu: true,
            fail_memory: true,
        }
    }
}

impl ProcessMetrics for FakeMetrics {
    fn name(&self) -> io::Result<String> {
        if self.fail_name {
            return Err(unavailable());
        }
        Ok("test_proc".to_string())
    }

    fn num_threads(&self) -> io::Result<i64> {
        if self.fail_threads {
            return Err(unavailable());
        }
        Ok(2)
    }

    fn num_fds(&self) -> io::Result<i64> {
        if self.fail_fds {
            return Err(unavailable());
        }
        Ok(5)
    }

    fn ctx_switches(&self) -> io::Result<CtxSwitches> {
        if self.fail_ctx {
            return Err(unavailable());
        }
        Ok(CtxSwitches {
            voluntary: 150,
            involuntary: 3,
        })
    }

    fn io_counters(&self) -> io::Result<IoCounters> {
        if self.fail_io {
            return Err(unavailable());
        }
        Ok(IoCounters {
            read_count: 9,
            write_count: 3,
            read_bytes: 4096,
            write_bytes: 8192,
        })
    }

    fn cpu_times(&self) -> io::Result<CpuTimes> {
        if self.fail_cpu {
            return Err(unavailable());
        }
        Ok(CpuTimes {
            user: 1.71,
            system: 0.28,
            ..CpuTimes::default()
        })
    }

    fn cpu_percent(&mut self) -> io::Result<f64> {
        if self.fail_cpu {
            return Err(unavailable());
        }
        Ok(12.5)
    }

    fn memory_info(&self) -> io::Result<MemoryInfo> {
        if self.fail_memory {
            return Err(unavailable());
        }
        Ok(MemoryInfo {
            rss: 3432 * 1024,
            vms: 10344 * 1024,
            swap: 0,
        })
    }
}

/// Source that hands out `FakeMetrics`, optionally refusing some PIDs to
/// model the exit-between-resolve-and-open race.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    fail_open: HashSet<Pid>,
}

impl FakeSource {
    pub fn failing_open(pids: &[Pid]) -> Self {
        FakeSource {
            fail_open: pids.iter().copied().collect(),
        }
    }
}

impl ProcessSource for FakeSource {
    fn open(&self, pid: Pid) -> Result<Box<dyn ProcessMetrics>, Error> {
        if self.fail_open.contains(&pid) {
            return Err(Error::ProcessNotFound {
                pid,
                source: unavailable(),
            });
        }
        Ok(Box::new(FakeMetrics::default()))
    }
}

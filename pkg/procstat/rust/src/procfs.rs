// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Per-process metric source reading /proc/<pid>.

use std::env;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use crate::errors::Error;
use crate::registry::ProcessSource;
use crate::Pid;

static PROC_ROOT: OnceLock<PathBuf> = OnceLock::new();

pub fn root_path() -> &'static Path {
    PROC_ROOT.get_or_init(|| {
        if let Ok(v) = env::var("HOST_PROC") {
            return v.into();
        }

        "/proc".into()
    })
}

/// Userspace clock tick used for the time fields in /proc/<pid>/stat.
/// Fixed at 100 by the procfs ABI regardless of the kernel tick rate.
const USER_HZ: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CtxSwitches {
    pub voluntary: i64,
    pub involuntary: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read_count: u64,
    pub write_count: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// CPU time breakdown in seconds. Per-process procfs only accounts user,
/// system, iowait and guest time; the remaining fields exist for record
/// shape compatibility and stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub nice: f64,
    pub iowait: f64,
    pub irq: f64,
    pub soft_irq: f64,
    pub steal: f64,
    pub stolen: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

impl CpuTimes {
    pub fn total(&self) -> f64 {
        self.user
            + self.system
            + self.idle
            + self.nice
            + self.iowait
            + self.irq
            + self.soft_irq
            + self.steal
            + self.stolen
            + self.guest
            + self.guest_nice
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub rss: u64,
    pub vms: u64,
    pub swap: u64,
}

/// Point-in-time OS metrics for one process. Every accessor fails
/// independently; a vanished process turns every call into an error while
/// the object itself stays valid.
pub trait ProcessMetrics {
    fn name(&self) -> io::Result<String>;
    fn num_threads(&self) -> io::Result<i64>;
    fn num_fds(&self) -> io::Result<i64>;
    fn ctx_switches(&self) -> io::Result<CtxSwitches>;
    fn io_counters(&self) -> io::Result<IoCounters>;
    fn cpu_times(&self) -> io::Result<CpuTimes>;
    /// Stateful two-sample estimator: the first poll seeds the baseline and
    /// returns 0.0, later polls return the busy-time rate since the
    /// previous poll.
    fn cpu_percent(&mut self) -> io::Result<f64>;
    fn memory_info(&self) -> io::Result<MemoryInfo>;
}

#[derive(Debug, Clone, Copy)]
struct CpuBaseline {
    busy: f64,
    at: Instant,
}

#[derive(Debug)]
pub struct ProcfsProcess {
    proc_path: PathBuf,
    baseline: Option<CpuBaseline>,
}

impl ProcfsProcess {
    pub fn open(pid: Pid) -> Result<Self, Error> {
        let proc_path = root_path().join(pid.to_string());
        if let Err(source) = fs::metadata(&proc_path) {
            return Err(Error::ProcessNotFound { pid, source });
        }
        Ok(ProcfsProcess {
            proc_path,
            baseline: None,
        })
    }

    fn read_status(&self) -> io::Result<Status> {
        let content = fs::read_to_string(self.proc_path.join("status"))?;
        Ok(parse_status(&content))
    }

    fn read_stat(&self) -> io::Result<Stat> {
        let content = fs::read_to_string(self.proc_path.join("stat"))?;
        parse_stat(&content).ok_or_else(|| invalid_data("malformed stat file"))
    }
}

fn invalid_data(context: &str) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, context.to_string())
}

impl ProcessMetrics for ProcfsProcess {
    fn name(&self) -> io::Result<String> {
        self.read_status()?
            .name
            .ok_or_else(|| invalid_data("status file has no Name field"))
    }

    fn num_threads(&self) -> io::Result<i64> {
        self.read_status()?
            .threads
            .ok_or_else(|| invalid_data("status file has no Threads field"))
    }

    fn num_fds(&self) -> io::Result<i64> {
        let entries = fs::read_dir(self.proc_path.join("fd"))?;
        let count = entries.filter(|entry| entry.is_ok()).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    fn ctx_switches(&self) -> io::Result<CtxSwitches> {
        let status = self.read_status()?;
        match (status.voluntary_ctxt_switches, status.nonvoluntary_ctxt_switches) {
            (Some(voluntary), Some(involuntary)) => Ok(CtxSwitches {
                voluntary,
                involuntary,
            }),
            _ => Err(invalid_data("status file has no context switch counts")),
        }
    }

    fn io_counters(&self) -> io::Result<IoCounters> {
        let content = fs::read_to_string(self.proc_path.join("io"))?;
        parse_io(&content).ok_or_else(|| invalid_data("malformed io file"))
    }

    fn cpu_times(&self) -> io::Result<CpuTimes> {
        let stat = self.read_stat()?;
        Ok(CpuTimes {
            user: stat.utime_ticks as f64 / USER_HZ,
            system: stat.stime_ticks as f64 / USER_HZ,
            iowait: stat.blkio_ticks as f64 / USER_HZ,
            guest: stat.guest_ticks as f64 / USER_HZ,
            ..CpuTimes::default()
        })
    }

    fn cpu_percent(&mut self) -> io::Result<f64> {
        let busy = self.cpu_times()?.total();
        let now = Instant::now();

        let Some(previous) = self.baseline.replace(CpuBaseline { busy, at: now }) else {
            return Ok(0.0);
        };

        let wall = now.duration_since(previous.at).as_secs_f64();
        if wall <= 0.0 {
            return Ok(0.0);
        }
        Ok(((busy - previous.busy).max(0.0) / wall) * 100.0)
    }

    fn memory_info(&self) -> io::Result<MemoryInfo> {
        let status = self.read_status()?;
        match (status.vm_rss_bytes, status.vm_size_bytes) {
            (Some(rss), Some(vms)) => Ok(MemoryInfo {
                rss,
                vms,
                // VmSwap is absent on kernels without CONFIG_MMU swap
                // accounting; report zero rather than failing the category.
                swap: status.vm_swap_bytes.unwrap_or(0),
            }),
            _ => Err(invalid_data("status file has no memory fields")),
        }
    }
}

/// Opens procfs-backed metric sources. The unit struct exists so the
/// registry can be driven by a fake source in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsSource;

impl ProcessSource for ProcfsSource {
    fn open(&self, pid: Pid) -> Result<Box<dyn ProcessMetrics>, Error> {
        Ok(Box::new(ProcfsProcess::open(pid)?))
    }
}

#[derive(Debug, Default)]
struct Status {
    name: Option<String>,
    threads: Option<i64>,
    vm_rss_bytes: Option<u64>,
    vm_size_bytes: Option<u64>,
    vm_swap_bytes: Option<u64>,
    voluntary_ctxt_switches: Option<i64>,
    nonvoluntary_ctxt_switches: Option<i64>,
}

fn parse_status(content: &str) -> Status {
    let mut status = Status::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key {
            "Name" => status.name = Some(value.trim().to_string()),
            "Threads" => status.threads = parse_number(value),
            "VmRSS" => status.vm_rss_bytes = parse_kb(value),
            "VmSize" => status.vm_size_bytes = parse_kb(value),
            "VmSwap" => status.vm_swap_bytes = parse_kb(value),
            "voluntary_ctxt_switches" => status.voluntary_ctxt_switches = parse_number(value),
            "nonvoluntary_ctxt_switches" => status.nonvoluntary_ctxt_switches = parse_number(value),
            _ => {}
        }
    }
    status
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.split_ascii_whitespace().next()?.parse().ok()
}

fn parse_kb(value: &str) -> Option<u64> {
    let kb: u64 = parse_number(value)?;
    kb.checked_mul(1024)
}

#[derive(Debug, PartialEq, Eq)]
struct Stat {
    utime_ticks: u64,
    stime_ticks: u64,
    num_threads: i64,
    blkio_ticks: u64,
    guest_ticks: u64,
}

/// Parse /proc/<pid>/stat. The comm field may contain spaces and even
/// closing parens, so field counting starts after the last ')'.
fn parse_stat(content: &str) -> Option<Stat> {
    let (_, rest) = content.rsplit_once(')')?;
    let mut fields = rest.split_ascii_whitespace();

    // rest starts at field 3 (state); stat fields are 1-based.
    let utime_ticks = fields.nth(11)?.parse().ok()?; // field 14
    let stime_ticks = fields.next()?.parse().ok()?; // field 15
    let num_threads = fields.nth(4)?.parse().ok()?; // field 20
    let blkio_ticks = fields.nth(21)?.parse().ok()?; // field 42
    let guest_ticks = fields.next()?.parse().ok()?; // field 43

    Some(Stat {
        utime_ticks,
        stime_ticks,
        num_threads,
        blkio_ticks,
        guest_ticks,
    })
}

fn parse_io(content: &str) -> Option<IoCounters> {
    let mut read_count = None;
    let mut write_count = None;
    let mut read_bytes = None;
    let mut write_bytes = None;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key {
            "syscr" => read_count = parse_number(value),
            "syscw" => write_count = parse_number(value),
            "read_bytes" => read_bytes = parse_number(value),
            "write_bytes" => write_bytes = parse_number(value),
            _ => {}
        }
    }

    Some(IoCounters {
        read_count: read_count?,
        write_count: write_count?,
        read_bytes: read_bytes?,
        write_bytes: write_bytes?,
    })
}

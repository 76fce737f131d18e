// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! PID-to-handle registry reconciled on every sampling cycle.

use std::collections::BTreeMap;
use std::collections::HashMap;

use log::debug;

use crate::procfs::ProcessMetrics;
use crate::Pid;

/// Opens a live metric source for a PID. Fails when the process no longer
/// exists, which reconciliation treats as a skip, not an error.
pub trait ProcessSource {
    fn open(&self, pid: Pid) -> Result<Box<dyn ProcessMetrics>, crate::Error>;
}

/// Tag adjustments applied once, when a handle is created. Retained handles
/// are never re-tagged on later cycles.
#[derive(Debug, Clone, Default)]
pub(crate) struct HandleOverrides {
    pub pid_tag: bool,
    pub process_name: Option<String>,
}

/// A monitored process: its live metric source, the tag set emitted with
/// every record, and whether a CPU baseline sample exists yet.
pub struct ProcHandle {
    pub(crate) pid: Pid,
    pub(crate) source: Box<dyn ProcessMetrics>,
    pub(crate) tags: BTreeMap<String, String>,
    /// False until the handle goes through its first snapshot. Only a warm
    /// handle may report a CPU-usage percentage, since the estimator needs
    /// two time-separated samples.
    pub(crate) has_cpu_baseline: bool,
}

impl ProcHandle {
    pub(crate) fn new(
        pid: Pid,
        source: Box<dyn ProcessMetrics>,
        base_tags: &BTreeMap<String, String>,
        overrides: &HandleOverrides,
    ) -> Self {
        let mut tags = base_tags.clone();
        if overrides.pid_tag {
            tags.insert("pid".to_string(), pid.to_string());
        }
        if let Some(name) = &overrides.process_name {
            tags.insert("process_name".to_string(), name.clone());
        }

        ProcHandle {
            pid,
            source,
            tags,
            has_cpu_baseline: false,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl std::fmt::Debug for ProcHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcHandle")
            .field("pid", &self.pid)
            .field("tags", &self.tags)
            .field("has_cpu_baseline", &self.has_cpu_baseline)
            .finish_non_exhaustive()
    }
}

/// Build the registry for the current cycle from the previous one and a
/// freshly resolved PID set. Retained PIDs keep their handle and thus their
/// sampling history; new PIDs get freshly created and tagged handles; PIDs
/// that failed to open are skipped for this cycle; everything else is
/// dropped.
pub(crate) fn reconcile(
    previous: HashMap<Pid, ProcHandle>,
    pids: &[Pid],
    base_tags: &BTreeMap<String, String>,
    overrides: &HandleOverrides,
    source: &dyn ProcessSource,
) -> HashMap<Pid, ProcHandle> {
    let mut previous = previous;
    let mut current = HashMap::with_capacity(pids.len());

    for &pid in pids {
        if let Some(handle) = previous.remove(&pid) {
            current.insert(pid, handle);
            continue;
        }

        match source.open(pid) {
            Ok(metrics) => {
                current.insert(pid, ProcHandle::new(pid, metrics, base_tags, overrides));
            }
            Err(e) => {
                // The process exited between resolution and open.
                debug!("skipping pid {pid}: {e}");
            }
        }
    }

    current
}

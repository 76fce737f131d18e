// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! One sampling cycle: resolve PIDs, reconcile the registry, snapshot every
//! handle and emit to the sink.

use std::collections::BTreeMap;
use std::collections::HashMap;

use log::debug;

use crate::config::{Config, MatchCriterion};
use crate::errors::Error;
use crate::pgrep::{Pgrep, PidResolver};
use crate::procfs::ProcfsSource;
use crate::registry::{self, HandleOverrides, ProcHandle, ProcessSource};
use crate::sink::Accumulator;
use crate::snapshot::{snapshot, MEASUREMENT};
use crate::Pid;

pub struct Procstat {
    criterion: MatchCriterion,
    base_tags: BTreeMap<String, String>,
    overrides: HandleOverrides,
    prefix: String,
    resolver: Box<dyn PidResolver>,
    source: Box<dyn ProcessSource>,
    procs: HashMap<Pid, ProcHandle>,
}

impl Procstat {
    /// Build a collector with the default backends: pgrep discovery and
    /// procfs metric sources.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let resolver = Pgrep::new()?;
        Self::with_backends(config, Box::new(resolver), Box::new(ProcfsSource))
    }

    /// Build a collector with explicit discovery and metric-source
    /// backends. This is the seam tests use to substitute fakes.
    pub fn with_backends(
        config: &Config,
        resolver: Box<dyn PidResolver>,
        source: Box<dyn ProcessSource>,
    ) -> Result<Self, Error> {
        let criterion = config.criterion()?;
        let base_tags = criterion.base_tags();
        let overrides = HandleOverrides {
            pid_tag: config.pid_tag,
            process_name: config.process_name.clone(),
        };

        Ok(Procstat {
            criterion,
            base_tags,
            overrides,
            prefix: config.prefix.clone().unwrap_or_default(),
            resolver,
            source,
            procs: HashMap::new(),
        })
    }

    pub fn criterion(&self) -> &MatchCriterion {
        &self.criterion
    }

    /// Number of processes currently held in the registry.
    pub fn tracked(&self) -> usize {
        self.procs.len()
    }

    /// Run one full cycle against the given sink. On discovery failure the
    /// registry is left untouched so the next cycle starts from the same
    /// state; nothing is emitted.
    pub fn gather(&mut self, acc: &mut dyn Accumulator) -> Result<(), Error> {
        let pids = self.criterion.resolve(self.resolver.as_ref())?;
        debug!(
            "resolved {} pid(s) for {}={}",
            pids.len(),
            self.criterion.tag_key(),
            self.criterion.tag_value()
        );

        let previous = std::mem::take(&mut self.procs);
        self.procs = registry::reconcile(
            previous,
            &pids,
            &self.base_tags,
            &self.overrides,
            self.source.as_ref(),
        );

        for handle in self.procs.values_mut() {
            let fields = snapshot(handle, &self.prefix);
            acc.add_fields(MEASUREMENT, fields, handle.tags());
        }

        Ok(())
    }
}

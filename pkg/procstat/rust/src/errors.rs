// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use thiserror::Error;

use crate::Pid;

#[derive(Error, Debug)]
pub enum Error {
    /// No match criterion was configured. Fatal: without a criterion there
    /// is nothing to monitor.
    #[error("no match criterion specified: set one of pid_file, exe, pattern or user")]
    NoCriterion,

    /// The PID discovery backend is unavailable or failed. The cycle emits
    /// nothing and the registry keeps its previous state for the next run.
    #[error("pid discovery failed: {context}")]
    Discovery { context: String },

    /// The process vanished between discovery and opening its metric
    /// source. Expected race; the caller skips the PID.
    #[error("process {pid} not found: {source}")]
    ProcessNotFound {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn discovery(context: impl Into<String>) -> Self {
        Error::Discovery {
            context: context.into(),
        }
    }
}

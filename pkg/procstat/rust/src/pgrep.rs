// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! PID discovery backed by the pgrep binary.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::errors::Error;
use crate::Pid;

/// Resolves a match criterion to the current set of matching PIDs. An empty
/// set is a valid answer; errors mean the enumeration mechanism itself
/// failed.
pub trait PidResolver {
    fn pid_file(&self, path: &Path) -> Result<Vec<Pid>, Error>;
    fn exe(&self, pattern: &str) -> Result<Vec<Pid>, Error>;
    fn full_pattern(&self, pattern: &str) -> Result<Vec<Pid>, Error>;
    fn user(&self, user: &str) -> Result<Vec<Pid>, Error>;
}

pub struct Pgrep {
    path: PathBuf,
}

impl Pgrep {
    pub fn new() -> Result<Self, Error> {
        let path = locate("pgrep").ok_or_else(|| Error::discovery("pgrep not found in PATH"))?;
        Ok(Pgrep { path })
    }

    fn gather(&self, args: &[&OsStr]) -> Result<Vec<Pid>, Error> {
        let output = Command::new(&self.path).args(args).output().map_err(|e| {
            Error::discovery(format!("running {}: {e}", self.path.display()))
        })?;

        match output.status.code() {
            Some(0) => {}
            // pgrep exits 1 when nothing matched; that is an empty set,
            // not a failure of the enumeration mechanism.
            Some(1) => return Ok(Vec::new()),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::discovery(format!(
                    "pgrep exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let pids = parse_pids(&stdout)?;
        debug!("pgrep {:?} matched {} pid(s)", args, pids.len());
        Ok(pids)
    }
}

impl PidResolver for Pgrep {
    fn pid_file(&self, path: &Path) -> Result<Vec<Pid>, Error> {
        self.gather(&[OsStr::new("-F"), path.as_os_str()])
    }

    fn exe(&self, pattern: &str) -> Result<Vec<Pid>, Error> {
        self.gather(&[OsStr::new(pattern)])
    }

    fn full_pattern(&self, pattern: &str) -> Result<Vec<Pid>, Error> {
        self.gather(&[OsStr::new("-f"), OsStr::new(pattern)])
    }

    fn user(&self, user: &str) -> Result<Vec<Pid>, Error> {
        self.gather(&[OsStr::new("-u"), OsStr::new(user)])
    }
}

fn locate(binary: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

fn parse_pids(out: &str) -> Result<Vec<Pid>, Error> {
    out.split_ascii_whitespace()
        .map(|field| {
            field.parse::<Pid>().map_err(|e| {
                Error::discovery(format!("unexpected pgrep output {field:?}: {e}"))
            })
        })
        .collect()
}

// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::errors::Error;
use crate::pgrep::PidResolver;
use crate::Pid;

const DEFAULT_INTERVAL_SECS: u64 = 10;

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Agent configuration. One of `pid_file`, `exe`, `pattern` or `user` must
/// be set; the remaining keys tune how records are tagged and emitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// PID file to monitor.
    #[serde(default)]
    pub pid_file: Option<PathBuf>,

    /// Executable name pattern (pgrep `<exe>`).
    #[serde(default)]
    pub exe: Option<String>,

    /// Full command-line pattern (pgrep `-f <pattern>`).
    #[serde(default)]
    pub pattern: Option<String>,

    /// Owning user name (pgrep `-u <user>`).
    #[serde(default)]
    pub user: Option<String>,

    /// Overrides the resolved process name tag.
    #[serde(default)]
    pub process_name: Option<String>,

    /// Field name prefix for every field except `pid`.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Emit the pid as a tag instead of a field.
    #[serde(default)]
    pub pid_tag: bool,

    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pid_file: None,
            exe: None,
            pattern: None,
            user: None,
            process_name: None,
            prefix: None,
            pid_tag: false,
            interval_secs: DEFAULT_INTERVAL_SECS,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Select the match criterion. When more than one is configured the
    /// first in the fixed order pid_file, exe, pattern, user wins and a
    /// warning names the choice.
    pub fn criterion(&self) -> Result<MatchCriterion, Error> {
        // An empty value counts as unset, matching configs that template
        // the key in unconditionally.
        let mut candidates: Vec<MatchCriterion> = Vec::new();
        if let Some(path) = &self.pid_file
            && !path.as_os_str().is_empty()
        {
            candidates.push(MatchCriterion::PidFile(path.clone()));
        }
        if let Some(exe) = &self.exe
            && !exe.is_empty()
        {
            candidates.push(MatchCriterion::Exe(exe.clone()));
        }
        if let Some(pattern) = &self.pattern
            && !pattern.is_empty()
        {
            candidates.push(MatchCriterion::Pattern(pattern.clone()));
        }
        if let Some(user) = &self.user
            && !user.is_empty()
        {
            candidates.push(MatchCriterion::User(user.clone()));
        }

        let mut candidates = candidates.into_iter();
        let Some(criterion) = candidates.next() else {
            return Err(Error::NoCriterion);
        };
        if candidates.next().is_some() {
            warn!(
                "multiple match criteria configured; using {}",
                criterion.tag_key()
            );
        }
        Ok(criterion)
    }

    pub fn log_level(&self) -> log::Level {
        match self.log_level.parse() {
            Ok(level) => level,
            Err(_) => {
                warn!("unknown log_level {:?}, defaulting to info", self.log_level);
                log::Level::Info
            }
        }
    }
}

/// The single rule used to select which processes to monitor. Modeling the
/// four mutually exclusive kinds as an enum makes a criterion-less
/// collector unrepresentable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCriterion {
    PidFile(PathBuf),
    Exe(String),
    Pattern(String),
    User(String),
}

impl MatchCriterion {
    /// Tag key describing the criterion kind on every emitted record.
    pub fn tag_key(&self) -> &'static str {
        match self {
            MatchCriterion::PidFile(_) => "pidfile",
            MatchCriterion::Exe(_) => "exe",
            MatchCriterion::Pattern(_) => "pattern",
            MatchCriterion::User(_) => "user",
        }
    }

    pub fn tag_value(&self) -> String {
        match self {
            MatchCriterion::PidFile(path) => path.display().to_string(),
            MatchCriterion::Exe(value)
            | MatchCriterion::Pattern(value)
            | MatchCriterion::User(value) => value.clone(),
        }
    }

    pub fn base_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.tag_key().to_string(), self.tag_value())])
    }

    pub(crate) fn resolve(&self, resolver: &dyn PidResolver) -> Result<Vec<Pid>, Error> {
        match self {
            MatchCriterion::PidFile(path) => resolver.pid_file(path),
            MatchCriterion::Exe(pattern) => resolver.exe(pattern),
            MatchCriterion::Pattern(pattern) => resolver.full_pattern(pattern),
            MatchCriterion::User(user) => resolver.user(user),
        }
    }
}

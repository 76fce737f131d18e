// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use log::error;
use serde::Serialize;

/// Numeric or counter value carried in a record field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Unsigned(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

/// Receives one record per monitored process per cycle. Implementations
/// must not fail the cycle; delivery problems are theirs to handle.
pub trait Accumulator {
    fn add_fields(
        &mut self,
        measurement: &str,
        fields: BTreeMap<String, FieldValue>,
        tags: &BTreeMap<String, String>,
    );
}

#[derive(Serialize)]
struct Record<'a> {
    name: &'a str,
    tags: &'a BTreeMap<String, String>,
    fields: &'a BTreeMap<String, FieldValue>,
    timestamp: u64,
}

/// Writes one JSON object per record, newline terminated.
pub struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        JsonLineSink { out }
    }
}

impl<W: Write> Accumulator for JsonLineSink<W> {
    fn add_fields(
        &mut self,
        measurement: &str,
        fields: BTreeMap<String, FieldValue>,
        tags: &BTreeMap<String, String>,
    ) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let record = Record {
            name: measurement,
            tags,
            fields: &fields,
            timestamp,
        };

        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to serialize record: {e}");
                return;
            }
        };
        line.push(b'\n');

        if let Err(e) = self.out.write_all(&line) {
            error!("failed to write record: {e}");
        }
    }
}

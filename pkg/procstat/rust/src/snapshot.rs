// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Builds one (fields, tags) record from a process handle. Assembly itself
//! never fails; every metric category is independently best-effort.

use std::collections::BTreeMap;

use crate::registry::ProcHandle;
use crate::sink::FieldValue;

pub const MEASUREMENT: &str = "procstat";

fn field_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}

/// Assemble the field set for one handle, mutating the handle's tag map
/// (resolved process name) and its CPU-baseline flag along the way.
pub(crate) fn snapshot(handle: &mut ProcHandle, prefix: &str) -> BTreeMap<String, FieldValue> {
    let mut fields = BTreeMap::new();

    // If the process_name tag is not already set, set it to the OS-reported
    // name. Failure to resolve leaves the tag absent.
    if !handle.tags.contains_key("process_name")
        && let Ok(name) = handle.source.name()
    {
        handle.tags.insert("process_name".to_string(), name);
    }

    // If pid is not present as a tag, include it as a field.
    if !handle.tags.contains_key("pid") {
        fields.insert("pid".to_string(), FieldValue::from(handle.pid));
    }

    if let Ok(num_threads) = handle.source.num_threads() {
        fields.insert(field_name(prefix, "num_threads"), num_threads.into());
    }

    if let Ok(fds) = handle.source.num_fds() {
        fields.insert(field_name(prefix, "num_fds"), fds.into());
    }

    if let Ok(ctx) = handle.source.ctx_switches() {
        fields.insert(
            field_name(prefix, "voluntary_context_switches"),
            ctx.voluntary.into(),
        );
        fields.insert(
            field_name(prefix, "involuntary_context_switches"),
            ctx.involuntary.into(),
        );
    }

    if let Ok(io) = handle.source.io_counters() {
        fields.insert(field_name(prefix, "read_count"), io.read_count.into());
        fields.insert(field_name(prefix, "write_count"), io.write_count.into());
        fields.insert(field_name(prefix, "read_bytes"), io.read_bytes.into());
        fields.insert(field_name(prefix, "write_bytes"), io.write_bytes.into());
    }

    if let Ok(cpu_time) = handle.source.cpu_times() {
        fields.insert(field_name(prefix, "cpu_time_user"), cpu_time.user.into());
        fields.insert(field_name(prefix, "cpu_time_system"), cpu_time.system.into());
        fields.insert(field_name(prefix, "cpu_time_idle"), cpu_time.idle.into());
        fields.insert(field_name(prefix, "cpu_time_nice"), cpu_time.nice.into());
        fields.insert(field_name(prefix, "cpu_time_iowait"), cpu_time.iowait.into());
        fields.insert(field_name(prefix, "cpu_time_irq"), cpu_time.irq.into());
        fields.insert(
            field_name(prefix, "cpu_time_soft_irq"),
            cpu_time.soft_irq.into(),
        );
        fields.insert(field_name(prefix, "cpu_time_steal"), cpu_time.steal.into());
        fields.insert(field_name(prefix, "cpu_time_stolen"), cpu_time.stolen.into());
        fields.insert(field_name(prefix, "cpu_time_guest"), cpu_time.guest.into());
        fields.insert(
            field_name(prefix, "cpu_time_guest_nice"),
            cpu_time.guest_nice.into(),
        );
    }

    // The percentage is polled every cycle so the source keeps a fresh
    // baseline, but the field is only reported once a prior sample exists.
    // The first snapshot for a handle therefore never carries cpu_usage.
    let warm = handle.has_cpu_baseline;
    let cpu_percent = handle.source.cpu_percent();
    handle.has_cpu_baseline = true;
    if warm && let Ok(percent) = cpu_percent {
        fields.insert(field_name(prefix, "cpu_usage"), percent.into());
    }

    if let Ok(memory) = handle.source.memory_info() {
        fields.insert(field_name(prefix, "memory_rss"), memory.rss.into());
        fields.insert(field_name(prefix, "memory_vms"), memory.vms.into());
        fields.insert(field_name(prefix, "memory_swap"), memory.swap.into());
    }

    fields
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::{HandleOverrides, ProcHandle};
    use crate::test_utils::FakeMetrics;

    fn handle_with(metrics: FakeMetrics, overrides: HandleOverrides) -> ProcHandle {
        let base_tags = BTreeMap::from([("exe".to_string(), "foo".to_string())]);
        ProcHandle::new(42, Box::new(metrics), &base_tags, &overrides)
    }

    #[test]
    fn first_snapshot_has_no_cpu_usage_and_warms_handle() {
        let mut handle = handle_with(FakeMetrics::default(), HandleOverrides::default());

        let fields = snapshot(&mut handle, "");
        assert!(!fields.contains_key("cpu_usage"));
        assert!(fields.contains_key("cpu_time_user"));
        assert!(handle.has_cpu_baseline);

        let fields = snapshot(&mut handle, "");
        assert!(fields.contains_key("cpu_usage"));
    }

    #[test]
    fn handle_warms_even_when_percent_read_fails() {
        let metrics = FakeMetrics {
            fail_cpu: true,
            ..FakeMetrics::default()
        };
        let mut handle = handle_with(metrics, HandleOverrides::default());

        let fields = snapshot(&mut handle, "");
        assert!(!fields.contains_key("cpu_usage"));
        assert!(handle.has_cpu_baseline);

        // Still warm, but the read keeps failing: no field.
        let fields = snapshot(&mut handle, "");
        assert!(!fields.contains_key("cpu_usage"));
    }

    #[test]
    fn pid_emitted_as_field_when_not_a_tag() {
        let mut handle = handle_with(FakeMetrics::default(), HandleOverrides::default());

        let fields = snapshot(&mut handle, "");
        assert_eq!(fields.get("pid"), Some(&FieldValue::Integer(42)));
        assert!(!handle.tags().contains_key("pid"));
    }

    #[test]
    fn pid_tag_suppresses_pid_field() {
        let overrides = HandleOverrides {
            pid_tag: true,
            process_name: None,
        };
        let mut handle = handle_with(FakeMetrics::default(), overrides);

        let fields = snapshot(&mut handle, "");
        assert!(!fields.contains_key("pid"));
        assert_eq!(handle.tags().get("pid").map(String::as_str), Some("42"));
    }

    #[test]
    fn prefix_applied_to_all_fields_except_pid() {
        let mut handle = handle_with(FakeMetrics::default(), HandleOverrides::default());

        let fields = snapshot(&mut handle, "svc");
        assert!(fields.contains_key("pid"));
        assert!(fields.contains_key("svc_num_threads"));
        assert!(fields.contains_key("svc_memory_rss"));
        assert!(fields.contains_key("svc_cpu_time_user"));
        assert!(!fields.contains_key("num_threads"));
        assert!(!fields.contains_key("svc_pid"));
    }

    #[test]
    fn process_name_resolved_when_absent() {
        let mut handle = handle_with(FakeMetrics::default(), HandleOverrides::default());
        snapshot(&mut handle, "");
        assert_eq!(
            handle.tags().get("process_name").map(String::as_str),
            Some("test_proc")
        );
    }

    #[test]
    fn process_name_override_not_replaced() {
        let overrides = HandleOverrides {
            pid_tag: false,
            process_name: Some("custom".to_string()),
        };
        let mut handle = handle_with(FakeMetrics::default(), overrides);
        snapshot(&mut handle, "");
        assert_eq!(
            handle.tags().get("process_name").map(String::as_str),
            Some("custom")
        );
    }

    #[test]
    fn name_failure_leaves_tag_absent() {
        let metrics = FakeMetrics {
            fail_name: true,
            ..FakeMetrics::default()
        };
        let mut handle = handle_with(metrics, HandleOverrides::default());
        snapshot(&mut handle, "");
        assert!(!handle.tags().contains_key("process_name"));
    }

    #[test]
    fn failed_category_does_not_abort_siblings() {
        let metrics = FakeMetrics {
            fail_io: true,
            fail_memory: true,
            ..FakeMetrics::default()
        };
        let mut handle = handle_with(metrics, HandleOverrides::default());

        let fields = snapshot(&mut handle, "");
        assert!(!fields.contains_key("read_bytes"));
        assert!(!fields.contains_key("memory_rss"));
        assert!(fields.contains_key("num_threads"));
        assert!(fields.contains_key("num_fds"));
        assert!(fields.contains_key("voluntary_context_switches"));
    }

    #[test]
    fn all_categories_failing_still_yields_pid_only_record() {
        let metrics = FakeMetrics::failing_all();
        let mut handle = handle_with(metrics, HandleOverrides::default());

        let fields = snapshot(&mut handle, "");
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("pid"));
    }
}

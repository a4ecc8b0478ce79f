// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod builder;
pub(crate) mod test_utils;

pub use builder::*;

use serde::{Deserialize, Serialize};

/// Delimiter between `key:\nvalue` blocks in the plain-text report body.
/// This is an on-disk contract: other tooling parses the sink output.
pub const REPORT_FIELD_SEPARATOR: &str = "\n-----------------------------\n";

/// Snapshot of process state at the moment of a crash.
///
/// Exactly one record exists per crash cycle and it is never mutated after
/// construction; sinks only read it. Field declaration order is the report
/// field order, both for the plain-text body and the JSON wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    /// Capture time, RFC3339, UTC.
    pub date: String,
    pub exec_path: String,
    /// Invocation arguments, joined with `", "`.
    pub argv: String,
    pub current_directory: String,
    /// Textual environment snapshot, deterministically ordered.
    pub env: String,
    pub process_title: String,
    /// Seconds since the reporter was constructed; `0.0` when unknown.
    pub uptime: f64,
    pub versions: String,
    pub memory_usage: String,
    /// Normalized error text: backtrace when one was captured, otherwise the
    /// raw error's textual form.
    pub error: String,
}

impl CrashRecord {
    /// Report key/value pairs, in report order. The keys are part of the
    /// on-disk and wire contracts.
    pub fn fields(&self) -> [(&'static str, String); 10] {
        [
            ("date", self.date.clone()),
            ("execPath", self.exec_path.clone()),
            ("argv", self.argv.clone()),
            ("currentDirectory", self.current_directory.clone()),
            ("env", self.env.clone()),
            ("processTitle", self.process_title.clone()),
            ("uptime", self.uptime.to_string()),
            ("versions", self.versions.clone()),
            ("memoryUsage", self.memory_usage.clone()),
            ("error", self.error.clone()),
        ]
    }

    /// The plain-text report body written by the file sink.
    pub fn to_text(&self) -> String {
        self.fields()
            .iter()
            .map(|(key, value)| format!("{key}:\n{value}"))
            .collect::<Vec<_>>()
            .join(REPORT_FIELD_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::test_record;
    use super::*;

    #[test]
    fn test_to_text_has_all_fields_in_order() {
        let record = test_record();
        let text = record.to_text();
        let blocks: Vec<&str> = text.split(REPORT_FIELD_SEPARATOR).collect();
        assert_eq!(blocks.len(), 10);

        let expected_keys = [
            "date",
            "execPath",
            "argv",
            "currentDirectory",
            "env",
            "processTitle",
            "uptime",
            "versions",
            "memoryUsage",
            "error",
        ];
        for (block, key) in blocks.iter().zip(expected_keys) {
            let (block_key, _) = block.split_once(":\n").unwrap();
            assert_eq!(block_key, key);
        }
    }

    #[test]
    fn test_to_text_round_trips_values() {
        let record = test_record();
        let text = record.to_text();
        for (key, value) in record.fields() {
            assert!(
                text.contains(&format!("{key}:\n{value}")),
                "missing block for {key}"
            );
        }
    }

    #[test]
    fn test_wire_keys_are_camel_case() {
        let record = test_record();
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "date",
            "execPath",
            "argv",
            "currentDirectory",
            "env",
            "processTitle",
            "uptime",
            "versions",
            "memoryUsage",
            "error",
        ] {
            assert!(json.get(key).is_some(), "missing wire field {key}");
        }
        assert_eq!(json["uptime"], serde_json::json!(12.5));
    }
}

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{DispatchOutcome, SinkError};
use crate::crash_info::CrashRecord;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info};

/// Writes the crash record to
/// `<out_dir>/crash_<YYYY>-<MM>-<DD>_<HH>-<mm>-<ss>_<mmm>_UTC.txt` as UTF-8
/// plain text. Filename and body format are a durable on-disk contract.
///
/// One write, no retry, no fallback path.
#[derive(Debug, Clone)]
pub struct FileSink {
    out_dir: PathBuf,
}

impl FileSink {
    /// `out_dir` defaults to the process working directory.
    pub fn new(out_dir: Option<PathBuf>) -> Self {
        let out_dir = out_dir
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self { out_dir }
    }

    fn output_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.out_dir
            .join(format!("crash_{}_UTC.txt", now.format("%Y-%m-%d_%H-%M-%S_%3f")))
    }

    pub fn dispatch(&self, record: &CrashRecord) -> DispatchOutcome {
        let path = self.output_path(Utc::now());
        match std::fs::write(&path, record.to_text()) {
            Ok(()) => {
                info!(file.path = %path.display(), "Crash file written");
                DispatchOutcome::Succeeded
            }
            Err(e) => {
                error!(file.path = %path.display(), error = %e, "Failed to write crash file");
                DispatchOutcome::Failed(SinkError::Io(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crash_info::test_utils::test_record;
    use crate::crash_info::REPORT_FIELD_SEPARATOR;
    use chrono::NaiveDateTime;

    #[test]
    fn test_output_path_matches_timestamp_pattern() {
        let sink = FileSink::new(Some(PathBuf::from("/tmp/out")));
        let now = "2024-03-07T04:05:06.007Z".parse::<DateTime<Utc>>().unwrap();
        let path = sink.output_path(now);
        assert_eq!(
            path,
            PathBuf::from("/tmp/out/crash_2024-03-07_04-05-06_007_UTC.txt")
        );
    }

    #[test]
    fn test_dispatch_writes_parseable_filename_and_full_body() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSink::new(Some(tmp.path().to_path_buf()));
        let record = test_record();

        assert_eq!(sink.dispatch(&record), DispatchOutcome::Succeeded);

        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);

        // The filename must round-trip through the documented pattern.
        let name = entries[0].file_name().unwrap().to_str().unwrap();
        assert!(
            NaiveDateTime::parse_from_str(name, "crash_%Y-%m-%d_%H-%M-%S_%3f_UTC.txt").is_ok(),
            "unexpected crash filename: {name}"
        );

        // The body must round-trip every record field as a key block.
        let body = std::fs::read_to_string(&entries[0]).unwrap();
        assert_eq!(body, record.to_text());
        assert_eq!(body.split(REPORT_FIELD_SEPARATOR).count(), 10);
    }

    #[test]
    fn test_dispatch_reports_io_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let sink = FileSink::new(Some(missing));

        match sink.dispatch(&test_record()) {
            DispatchOutcome::Failed(SinkError::Io(_)) => {}
            other => panic!("expected i/o failure, got {other:?}"),
        }
    }
}

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::CrashRecord;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;

/// Builds a [`CrashRecord`] from an error and ambient process facts.
///
/// `build` is infallible by design: snapshot construction happens while the
/// process is already dying, so every field that was not set explicitly is
/// collected from the live process, and every fact that cannot be collected
/// degrades to a documented sentinel (empty string, `0.0` uptime) instead of
/// aborting the crash cycle.
#[derive(Debug, Default)]
pub struct CrashRecordBuilder {
    date: Option<String>,
    exec_path: Option<String>,
    argv: Option<String>,
    current_directory: Option<String>,
    env: Option<String>,
    process_title: Option<String>,
    uptime: Option<f64>,
    versions: Option<String>,
    memory_usage: Option<String>,
    error: Option<String>,
}

impl CrashRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: String) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_exec_path(mut self, exec_path: String) -> Self {
        self.exec_path = Some(exec_path);
        self
    }

    pub fn with_argv(mut self, argv: String) -> Self {
        self.argv = Some(argv);
        self
    }

    pub fn with_current_directory(mut self, current_directory: String) -> Self {
        self.current_directory = Some(current_directory);
        self
    }

    pub fn with_env(mut self, env: String) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_process_title(mut self, process_title: String) -> Self {
        self.process_title = Some(process_title);
        self
    }

    pub fn with_uptime(mut self, uptime: f64) -> Self {
        self.uptime = Some(uptime);
        self
    }

    pub fn with_versions(mut self, versions: String) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn with_memory_usage(mut self, memory_usage: String) -> Self {
        self.memory_usage = Some(memory_usage);
        self
    }

    /// Sets the normalized error text.
    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn build(self) -> CrashRecord {
        CrashRecord {
            date: self.date.unwrap_or_else(|| Utc::now().to_rfc3339()),
            exec_path: self.exec_path.unwrap_or_else(exec_path),
            argv: self.argv.unwrap_or_else(argv),
            current_directory: self.current_directory.unwrap_or_else(current_directory),
            env: self.env.unwrap_or_else(environment),
            process_title: self.process_title.unwrap_or_else(process_title),
            uptime: self.uptime.unwrap_or(0.0),
            versions: self.versions.unwrap_or_else(versions),
            memory_usage: self.memory_usage.unwrap_or_else(memory_usage),
            error: self.error.unwrap_or_default(),
        }
    }
}

fn exec_path() -> String {
    std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}

fn argv() -> String {
    std::env::args().collect::<Vec<_>>().join(", ")
}

fn current_directory() -> String {
    std::env::current_dir()
        .map(|path| path.display().to_string())
        .unwrap_or_default()
}

fn environment() -> String {
    // BTreeMap so the snapshot is deterministically ordered.
    let vars: BTreeMap<String, String> = std::env::vars().collect();
    format!("{vars:?}")
}

fn process_title() -> String {
    std::env::args()
        .next()
        .map(|argv0| {
            Path::new(&argv0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or(argv0)
        })
        .unwrap_or_default()
}

fn versions() -> String {
    format!(
        "{} ({} {})",
        os_info::get(),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

fn memory_usage() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let lines: Vec<&str> = status
                .lines()
                .filter(|line| line.starts_with("Vm"))
                .collect();
            if !lines.is_empty() {
                return lines.join(", ");
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_build_with_no_setters_fills_every_field() {
        let record = CrashRecordBuilder::new().build();

        assert!(DateTime::parse_from_rfc3339(&record.date).is_ok());
        assert!(!record.argv.is_empty());
        assert!(!record.process_title.is_empty());
        assert!(!record.versions.is_empty());
        // Sentinels for the facts the pure builder cannot know.
        assert_eq!(record.uptime, 0.0);
        assert_eq!(record.error, "");
    }

    #[test]
    fn test_setters_override_ambient_facts() {
        let record = CrashRecordBuilder::new()
            .with_date("2019-09-19T00:00:00+00:00".to_string())
            .with_exec_path("/bin/svc1".to_string())
            .with_argv("/bin/svc1, --flag".to_string())
            .with_current_directory("/srv".to_string())
            .with_env("{}".to_string())
            .with_process_title("svc1".to_string())
            .with_uptime(3.25)
            .with_versions("test 1.0".to_string())
            .with_memory_usage("VmRSS: 1 kB".to_string())
            .with_error("boom".to_string())
            .build();

        assert_eq!(record.date, "2019-09-19T00:00:00+00:00");
        assert_eq!(record.exec_path, "/bin/svc1");
        assert_eq!(record.argv, "/bin/svc1, --flag");
        assert_eq!(record.current_directory, "/srv");
        assert_eq!(record.env, "{}");
        assert_eq!(record.process_title, "svc1");
        assert_eq!(record.uptime, 3.25);
        assert_eq!(record.versions, "test 1.0");
        assert_eq!(record.memory_usage, "VmRSS: 1 kB");
        assert_eq!(record.error, "boom");
    }

    #[test]
    fn test_environment_snapshot_is_deterministic() {
        assert_eq!(environment(), environment());
    }

    #[test]
    fn test_build_is_deterministic_given_identical_inputs() {
        let build = || {
            CrashRecordBuilder::new()
                .with_date("2019-09-19T00:00:00+00:00".to_string())
                .with_env("{}".to_string())
                .with_memory_usage("VmRSS: 1 kB".to_string())
                .with_error("boom".to_string())
                .build()
        };
        assert_eq!(build(), build());
    }
}

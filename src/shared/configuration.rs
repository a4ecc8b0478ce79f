// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::shared::constants;
use http::{Method, Uri};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The kinds of sinks a crash report can be dispatched to.
///
/// The declaration order is the fixed dispatch priority order: the file write
/// is issued before the HTTP attempt, which is issued before email.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SinkKind {
    File,
    Http,
    /// Reserved extension point; see [`crate::EmailSink`].
    Email,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::File => "file",
            SinkKind::Http => "http",
            SinkKind::Email => "email",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings for the HTTP sink.
///
/// The sink only performs a request when both a target url and a report
/// identifier are present; otherwise it is a no-op that reports success.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSinkConfig {
    url: Option<Uri>,
    method: Method,
    tags: Vec<String>,
    name_id: Option<String>,
}

impl HttpSinkConfig {
    pub fn new(
        url: Option<Uri>,
        method: Option<Method>,
        tags: Vec<String>,
        name_id: Option<String>,
    ) -> Self {
        Self {
            url,
            method: method.unwrap_or(Method::GET),
            tags,
            name_id,
        }
    }

    pub fn url(&self) -> Option<&Uri> {
        self.url.as_ref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn name_id(&self) -> Option<&str> {
        self.name_id.as_deref()
    }

    /// True iff the sink has everything it needs to actually send a request.
    pub fn is_actionable(&self) -> bool {
        self.url.is_some() && self.name_id.is_some()
    }
}

impl Default for HttpSinkConfig {
    fn default() -> Self {
        Self::new(None, None, Vec::new(), None)
    }
}

/// Immutable reporter configuration, validated once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CrashReporterConfiguration {
    sinks: Vec<SinkKind>,
    exit_on_crash: bool,
    exit_code: i32,
    file_out_dir: Option<PathBuf>,
    http: HttpSinkConfig,
    timeout: Duration,
}

impl CrashReporterConfiguration {
    pub fn new(
        mut sinks: Vec<SinkKind>,
        exit_on_crash: bool,
        exit_code: Option<i32>,
        file_out_dir: Option<PathBuf>,
        http: HttpSinkConfig,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        // Ensure we don't have double elements in the sink list. Sorting also
        // normalizes the caller's order to the dispatch priority order.
        let before_len = sinks.len();
        sinks.sort();
        sinks.dedup();
        anyhow::ensure!(
            before_len == sinks.len(),
            "Sink list contained duplicate elements"
        );

        if sinks.contains(&SinkKind::Http) && !http.is_actionable() {
            tracing::warn!(
                http.has_url = http.url.is_some(),
                http.has_name_id = http.name_id.is_some(),
                "Http sink is active but missing its target url or report identifier, it will be a no-op"
            );
        }

        Ok(Self {
            sinks,
            exit_on_crash,
            exit_code: exit_code.unwrap_or(1),
            file_out_dir,
            http,
            timeout: timeout.unwrap_or(constants::DEFAULT_DISPATCH_TIMEOUT),
        })
    }

    pub fn sinks(&self) -> &[SinkKind] {
        &self.sinks
    }

    pub fn exit_on_crash(&self) -> bool {
        self.exit_on_crash
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn file_out_dir(&self) -> Option<&PathBuf> {
        self.file_out_dir.as_ref()
    }

    pub fn http(&self) -> &HttpSinkConfig {
        &self.http
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config = CrashReporterConfiguration::new(
            vec![SinkKind::File],
            false,
            None,
            None,
            HttpSinkConfig::default(),
            None,
        )?;
        assert_eq!(config.exit_code(), 1);
        assert_eq!(config.timeout(), constants::DEFAULT_DISPATCH_TIMEOUT);
        assert!(!config.exit_on_crash());
        assert_eq!(config.sinks(), &[SinkKind::File]);
        assert_eq!(*config.http().method(), Method::GET);
        Ok(())
    }

    #[test]
    fn test_duplicate_sinks_rejected() {
        let result = CrashReporterConfiguration::new(
            vec![SinkKind::File, SinkKind::Http, SinkKind::File],
            false,
            None,
            None,
            HttpSinkConfig::default(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_sink_order_normalized_to_priority_order() -> anyhow::Result<()> {
        let config = CrashReporterConfiguration::new(
            vec![SinkKind::Email, SinkKind::Http, SinkKind::File],
            false,
            None,
            None,
            HttpSinkConfig::default(),
            None,
        )?;
        assert_eq!(
            config.sinks(),
            &[SinkKind::File, SinkKind::Http, SinkKind::Email]
        );
        Ok(())
    }

    #[test]
    fn test_http_degrades_without_name_id() -> anyhow::Result<()> {
        let http = HttpSinkConfig::new(
            Some("http://example.test/report".parse()?),
            Some(Method::POST),
            vec!["team:runtime".to_string()],
            None,
        );
        assert!(!http.is_actionable());

        // Not a construction error.
        let config = CrashReporterConfiguration::new(
            vec![SinkKind::Http],
            false,
            None,
            None,
            http,
            None,
        )?;
        assert!(!config.http().is_actionable());
        Ok(())
    }

    #[test]
    fn test_http_actionable_with_url_and_name_id() -> anyhow::Result<()> {
        let http = HttpSinkConfig::new(
            Some("http://example.test/report".parse()?),
            None,
            Vec::new(),
            Some("svc1".to_string()),
        );
        assert!(http.is_actionable());
        assert_eq!(http.name_id(), Some("svc1"));
        Ok(())
    }
}

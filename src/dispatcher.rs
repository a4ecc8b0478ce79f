// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::crash_info::CrashRecord;
use crate::shared::configuration::{CrashReporterConfiguration, SinkKind};
use crate::sinks::http_client::HttpClient;
use crate::sinks::{DispatchOutcome, EmailSink, FileSink, HttpSink, Sink, SinkError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::error;

/// Aggregated result of one dispatch cycle: one outcome per configured sink,
/// in dispatch priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: Vec<(SinkKind, DispatchOutcome)>,
}

impl DispatchReport {
    pub(crate) fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    pub fn outcome(&self, kind: SinkKind) -> Option<&DispatchOutcome> {
        self.outcomes
            .iter()
            .find(|(sink, _)| *sink == kind)
            .map(|(_, outcome)| outcome)
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_success())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(SinkKind, DispatchOutcome)> + '_ {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Owns the configured sinks and fans one crash record out to all of them.
///
/// Invocations are issued in the fixed priority order file, http, email so
/// side effects start deterministically; completions may arrive in any
/// order. One sink failing never prevents the others from running, and no
/// sink error escapes `run_all`.
pub struct Dispatcher {
    sinks: Vec<Sink>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Sink>, timeout: Duration) -> Self {
        Self { sinks, timeout }
    }

    /// Builds the active sinks from the configuration, in priority order.
    pub fn from_configuration(
        config: &CrashReporterConfiguration,
        client: Arc<dyn HttpClient + Send + Sync>,
    ) -> Self {
        let mut sinks = Vec::with_capacity(config.sinks().len());
        if config.sinks().contains(&SinkKind::File) {
            sinks.push(Sink::File(FileSink::new(config.file_out_dir().cloned())));
        }
        if config.sinks().contains(&SinkKind::Http) {
            sinks.push(Sink::Http(HttpSink::new(config.http().clone(), client)));
        }
        if config.sinks().contains(&SinkKind::Email) {
            sinks.push(Sink::Email(EmailSink::new()));
        }
        Self::new(sinks, config.timeout())
    }

    /// Dispatches `record` to every sink and waits for all of them to settle,
    /// bounded by the configured timeout. Sinks that have not settled by the
    /// deadline are aborted and reported as timed out; they never block
    /// process exit indefinitely.
    pub async fn run_all(&self, record: Arc<CrashRecord>) -> DispatchReport {
        let deadline = Instant::now() + self.timeout;

        let mut tasks = Vec::with_capacity(self.sinks.len());
        for sink in &self.sinks {
            let kind = sink.kind();
            let sink = sink.clone();
            let record = Arc::clone(&record);
            let handle = tokio::spawn(async move { sink.dispatch(&record).await });
            tasks.push((kind, handle));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (kind, handle) in tasks {
            let abort = handle.abort_handle();
            let outcome = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_error)) => {
                    error!(sink = %kind, error = %join_error, "Sink task did not run to completion");
                    DispatchOutcome::Failed(SinkError::Panicked)
                }
                Err(_elapsed) => {
                    abort.abort();
                    error!(sink = %kind, "Sink did not settle before the dispatch deadline");
                    DispatchOutcome::Failed(SinkError::Timeout)
                }
            };
            outcomes.push((kind, outcome));
        }
        DispatchReport { outcomes }
    }
}

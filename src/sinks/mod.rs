// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod email;
mod file;
mod http;
pub(crate) mod http_client;

pub use email::EmailSink;
pub use file::FileSink;
pub use http::HttpSink;
pub use http_client::{HttpClient, HyperClient, ResponseFuture};

use crate::crash_info::CrashRecord;
use crate::shared::configuration::SinkKind;

/// Why a sink failed to deliver the crash report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("sink did not settle before the dispatch deadline")]
    Timeout,
    #[error("email dispatch is not implemented")]
    Unimplemented,
    #[error("sink task panicked")]
    Panicked,
}

/// Per-sink result of one dispatch attempt. Sinks are invoked at most once
/// per crash cycle; there are no retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeeded,
    Failed(SinkError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded)
    }
}

/// A configured sink instance. One variant per [`SinkKind`], each consuming
/// the same immutable crash record and performing one side effect.
#[derive(Clone)]
pub enum Sink {
    File(FileSink),
    Http(HttpSink),
    Email(EmailSink),
}

impl Sink {
    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::File(_) => SinkKind::File,
            Sink::Http(_) => SinkKind::Http,
            Sink::Email(_) => SinkKind::Email,
        }
    }

    pub async fn dispatch(&self, record: &CrashRecord) -> DispatchOutcome {
        match self {
            Sink::File(sink) => sink.dispatch(record),
            Sink::Http(sink) => sink.dispatch(record).await,
            Sink::Email(sink) => sink.dispatch(record),
        }
    }
}

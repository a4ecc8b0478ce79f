// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Process-wide crash reporting: intercepts otherwise-fatal unhandled errors,
//! captures a structured snapshot of process state, dispatches it to the
//! configured sinks, and optionally terminates the process once every sink
//! has settled.
//!
//! Architecturally, it consists of three parts:
//! 1. The crash controller ([`CrashReporter`]), which registers a single
//!    global panic hook through an explicit `install`/`uninstall` pair and
//!    guarantees at most one crash cycle runs per process. The hook chains
//!    the previously installed hook, so the host's own panic handling keeps
//!    working.
//! 2. The snapshot builder ([`CrashRecordBuilder`]), which turns the error
//!    and ambient process facts (argv, working directory, environment,
//!    uptime, memory usage) into an immutable [`CrashRecord`]. It cannot
//!    fail: facts that are unavailable degrade to documented sentinels, and
//!    an error without a backtrace falls back to its textual form.
//! 3. The dispatcher ([`Dispatcher`]), which fans the record out to the
//!    active sinks (file, HTTP endpoint, email stub) in a fixed priority
//!    order, isolates their failures from each other, and waits for all of
//!    them to settle under a bounded timeout before the controller is
//!    allowed to exit the process.
//!
//! There is deliberately no retry, no deduplication and no rate limiting:
//! a crash cycle runs once, reports once per sink, and ends.

mod crash_handler;
mod crash_info;
mod dispatcher;
mod shared;
mod sinks;

pub use crash_handler::{normalized_error_text, CrashCycleOutcome, CrashReporter};
pub use crash_info::{CrashRecord, CrashRecordBuilder, REPORT_FIELD_SEPARATOR};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use shared::configuration::{CrashReporterConfiguration, HttpSinkConfig, SinkKind};
pub use shared::constants::DEFAULT_DISPATCH_TIMEOUT;
pub use sinks::{
    DispatchOutcome, EmailSink, FileSink, HttpClient, HttpSink, HyperClient, ResponseFuture, Sink,
    SinkError,
};

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{DispatchOutcome, SinkError};
use crate::crash_info::CrashRecord;
use tracing::warn;

/// Extension point for email delivery. The send action is intentionally not
/// implemented in this crate: a real implementation plugs in behind the same
/// dispatch contract without touching the dispatcher. Excluded from
/// configurations by default.
#[derive(Debug, Clone, Default)]
pub struct EmailSink;

impl EmailSink {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch(&self, _record: &CrashRecord) -> DispatchOutcome {
        warn!("Email sink invoked but sending is not implemented");
        DispatchOutcome::Failed(SinkError::Unimplemented)
    }
}

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// How long the dispatcher waits for all sinks to settle before unsettled
/// sinks are reported as timed out. Applies per crash cycle, not per sink.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]

use super::CrashRecord;

pub(crate) fn test_record() -> CrashRecord {
    CrashRecord {
        date: "2019-09-19T00:00:00+00:00".to_string(),
        exec_path: "/usr/local/bin/svc1".to_string(),
        argv: "/usr/local/bin/svc1, --port, 8080".to_string(),
        current_directory: "/srv/svc1".to_string(),
        env: "{\"PATH\": \"/usr/bin\"}".to_string(),
        process_title: "svc1".to_string(),
        uptime: 12.5,
        versions: "Linux 6.1 (linux x86_64)".to_string(),
        memory_usage: "VmRSS:\t  4096 kB".to_string(),
        error: "panicked at src/main.rs:1:1: boom".to_string(),
    }
}

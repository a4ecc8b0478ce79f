// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::http_client::HttpClient;
use super::{DispatchOutcome, SinkError};
use crate::crash_info::CrashRecord;
use crate::shared::configuration::HttpSinkConfig;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Serialize)]
struct ReportData<'a> {
    #[serde(flatten)]
    record: &'a CrashRecord,
    #[serde(rename = "nameId")]
    name_id: &'a str,
}

/// Wire body: `{"data": {<record fields>, "nameId": ...}, "tags": [...]}`.
#[derive(Serialize)]
struct ReportPayload<'a> {
    data: ReportData<'a>,
    tags: &'a [String],
}

/// Sends the crash record as JSON to the configured endpoint, exactly once.
/// Success is any response with a status below 300.
///
/// When the target url or the report identifier is missing the sink was never
/// meant to run: it performs no request and reports success.
#[derive(Clone)]
pub struct HttpSink {
    config: HttpSinkConfig,
    client: Arc<dyn HttpClient + Send + Sync>,
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig, client: Arc<dyn HttpClient + Send + Sync>) -> Self {
        Self { config, client }
    }

    pub async fn dispatch(&self, record: &CrashRecord) -> DispatchOutcome {
        let (Some(url), Some(name_id)) = (self.config.url(), self.config.name_id()) else {
            debug!("Http sink has no target url or report identifier, nothing to do");
            return DispatchOutcome::Succeeded;
        };

        let payload = ReportPayload {
            data: ReportData { record, name_id },
            tags: self.config.tags(),
        };
        let body = match serde_json::to_vec(&payload) {
            Ok(body) => Bytes::from(body),
            Err(e) => return DispatchOutcome::Failed(SinkError::Transport(e.to_string())),
        };

        let req = match http::Request::builder()
            .method(self.config.method().clone())
            .uri(url.clone())
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
        {
            Ok(req) => req,
            Err(e) => return DispatchOutcome::Failed(SinkError::Transport(e.to_string())),
        };

        match self.client.request(req).await {
            Ok(response) if response.status().as_u16() < 300 => {
                info!(
                    http.url = %url,
                    http.name_id = name_id,
                    http.status = response.status().as_u16(),
                    "Crash report request succeeded"
                );
                DispatchOutcome::Succeeded
            }
            Ok(response) => {
                let status = response.status().as_u16();
                error!(
                    http.url = %url,
                    http.name_id = name_id,
                    http.status = status,
                    "Crash report request was rejected"
                );
                DispatchOutcome::Failed(SinkError::Status(status))
            }
            Err(e) => {
                error!(http.url = %url, http.name_id = name_id, error = %e, "Crash report request failed");
                DispatchOutcome::Failed(SinkError::Transport(e.to_string()))
            }
        }
    }
}

// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use std::future::Future;
use std::pin::Pin;

pub type ResponseFuture =
    Pin<Box<dyn Future<Output = anyhow::Result<http::Response<Bytes>>> + Send>>;

/// Transport capability used by the HTTP sink to perform its single request.
/// The reporter ships a hyper-backed implementation; tests plug in a
/// recording mock.
pub trait HttpClient {
    fn request(&self, req: http::Request<Bytes>) -> ResponseFuture;
}

/// hyper-backed [`HttpClient`].
pub struct HyperClient;

impl HttpClient for HyperClient {
    fn request(&self, req: http::Request<Bytes>) -> ResponseFuture {
        Box::pin(async move {
            // A crash cycle sends exactly one request, so don't keep
            // connections around.
            let client = hyper_util::client::legacy::Client::builder(
                hyper_util::rt::TokioExecutor::default(),
            )
            .pool_max_idle_per_host(0)
            .build_http::<Full<Bytes>>();

            let (parts, body) = req.into_parts();
            let response: http::Response<hyper::body::Incoming> = client
                .request(http::Request::from_parts(parts, Full::new(body)))
                .await?;
            let (parts, body) = response.into_parts();
            let body = body.collect().await?.to_bytes();
            Ok(http::Response::from_parts(parts, body))
        })
    }
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::credential::Credentials;
use crate::handlers::{HandlerList, Handlers};
use crate::retry::{DefaultRetryer, Retryer};
use crate::{Context, Error, Result};
use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::{HeaderValue, Method};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{self, Debug};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Operation describes the API a request calls.
#[derive(Debug, Clone, Default)]
pub struct Operation {
    /// Name of the service, used for logging.
    pub service_name: String,
    /// Name of the API, used for logging.
    pub name: String,
    /// HTTP method.
    pub method: Method,
    /// Host of the service, with or without scheme.
    pub host: String,
    /// Path including the query string.
    pub path: String,
    /// Content type that overrides the one derived from the body.
    pub content_type: Option<String>,
}

impl Operation {
    /// Create an operation.
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a `GET` operation.
    pub fn get(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::GET, host, path)
    }

    /// Create a `POST` operation.
    pub fn post(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(Method::POST, host, path)
    }

    /// Set the service and API names.
    pub fn with_name(mut self, service_name: &str, name: &str) -> Self {
        self.service_name = service_name.to_string();
        self.name = name.to_string();
        self
    }

    /// Force the content type of the encoded body.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// Input body of a request, encoded by the build stage.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Bytes sent as-is.
    Raw(Bytes),
    /// JSON document.
    Json(serde_json::Value),
    /// Form pairs, sent url-encoded.
    Form(Vec<(String, String)>),
}

impl Body {
    /// Serialize a value into a JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Build a form body from key/value pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// DecodeTarget receives a decoded response body.
///
/// Implemented for every `serde` deserializable type. The target is replaced
/// only when decoding succeeds.
pub trait DecodeTarget: Send + Sync {
    /// Decode a JSON document into self.
    fn decode_json(&mut self, content: &[u8]) -> Result<()>;
}

impl<T: DeserializeOwned + Send + Sync> DecodeTarget for T {
    fn decode_json(&mut self, content: &[u8]) -> Result<()> {
        *self = serde_json::from_slice(content)?;
        Ok(())
    }
}

/// CancelSignal resolves once the request is cancelled or its deadline passed.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// Wait until the request must stop, returning the error to record.
    pub async fn wait(&self) -> Error {
        let by_token = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => pending().await,
            }
        };
        let by_deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = by_token => Error::cancelled("request cancelled"),
            _ = by_deadline => Error::cancelled("request deadline exceeded"),
        }
    }
}

/// Request carries all state of one API call through the handler pipeline.
pub struct Request<'a> {
    ctx: Context,
    handlers: Handlers,
    operation: Operation,
    body: Body,

    http_request: http::Request<Bytes>,
    http_response: Option<http::Response<Bytes>>,
    data: Option<&'a mut dyn DecodeTarget>,

    error: Option<Error>,
    retry_count: u32,
    retryable: Option<bool>,
    retryer: Arc<dyn Retryer>,

    credentials: Option<Arc<Credentials>>,
    signed: bool,
    cancel: CancelSignal,

    started_at: Instant,
    sent: bool,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Build,
    Sign,
    Send,
    ValidateResponse,
    Unmarshal,
    AfterRetry,
    Complete,
}

impl Handlers {
    fn stage(&self, stage: Stage) -> &HandlerList {
        match stage {
            Stage::Build => &self.build,
            Stage::Sign => &self.sign,
            Stage::Send => &self.send,
            Stage::ValidateResponse => &self.validate_response,
            Stage::Unmarshal => &self.unmarshal,
            Stage::AfterRetry => &self.after_retry,
            Stage::Complete => &self.complete,
        }
    }
}

impl<'a> Request<'a> {
    /// Create a request for the operation, running the given handlers.
    pub fn new(ctx: Context, handlers: Handlers, operation: Operation) -> Self {
        let mut http_request = http::Request::new(Bytes::new());
        *http_request.method_mut() = operation.method.clone();

        Self {
            ctx,
            handlers,
            operation,
            body: Body::Empty,
            http_request,
            http_response: None,
            data: None,
            error: None,
            retry_count: 0,
            retryable: None,
            retryer: Arc::new(DefaultRetryer::default()),
            credentials: None,
            signed: false,
            cancel: CancelSignal::default(),
            started_at: Instant::now(),
            sent: false,
        }
    }

    /// Set the input body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set the value a successful JSON response is decoded into.
    pub fn with_data<T: DecodeTarget + 'a>(mut self, data: &'a mut T) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the retryer.
    pub fn with_retryer(mut self, retryer: Arc<dyn Retryer>) -> Self {
        self.retryer = retryer;
        self
    }

    /// Attach credentials used by signing handlers.
    pub fn with_credentials(mut self, credentials: Arc<Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Abort the request once the token is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel.token = Some(token);
        self
    }

    /// Abort the request once the deadline passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.cancel.deadline = Some(deadline);
        self
    }

    /// Abort the request once the timeout elapsed, counted from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set a header on the outbound request.
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.http_request.headers_mut().insert(name, value);
        self
    }

    /// Context of this request.
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Operation of this request.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Input body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Handlers this request runs, mutable until [`Request::send`] is called.
    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// Outbound HTTP request.
    pub fn http_request(&self) -> &http::Request<Bytes> {
        &self.http_request
    }

    /// Mutable outbound HTTP request.
    pub fn http_request_mut(&mut self) -> &mut http::Request<Bytes> {
        &mut self.http_request
    }

    /// Inbound HTTP response of the latest attempt.
    pub fn http_response(&self) -> Option<&http::Response<Bytes>> {
        self.http_response.as_ref()
    }

    /// Record the response of an attempt.
    pub fn set_http_response(&mut self, resp: http::Response<Bytes>) {
        self.http_response = Some(resp);
    }

    /// Check if a decode target is set.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Decode a JSON document into the decode target, if any.
    pub fn decode_data(&mut self, content: &[u8]) -> Result<()> {
        match self.data.as_mut() {
            Some(data) => data.decode_json(content),
            None => Ok(()),
        }
    }

    /// Error recorded so far.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Record an error, replacing any previous one.
    pub fn set_error(&mut self, err: Error) {
        self.error = Some(err);
    }

    /// Clear the recorded error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Number of retries performed so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Override the retry count.
    pub fn set_retry_count(&mut self, retry_count: u32) {
        self.retry_count = retry_count;
    }

    /// Retryable hint set by after-retry handlers.
    pub fn retryable(&self) -> Option<bool> {
        self.retryable
    }

    /// Set the retryable hint for the current error.
    pub fn set_retryable(&mut self, retryable: bool) {
        self.retryable = Some(retryable);
    }

    /// Retryer of this request.
    pub fn retryer(&self) -> &Arc<dyn Retryer> {
        &self.retryer
    }

    /// Credentials attached to this request.
    pub fn credentials(&self) -> Option<&Arc<Credentials>> {
        self.credentials.as_ref()
    }

    /// Set the `Authorization` header computed by a signing handler.
    ///
    /// Unlike a header set by the caller, it is removed before every retry
    /// so the sign stage computes it again.
    pub fn set_signature(&mut self, mut value: HeaderValue) {
        value.set_sensitive(true);
        self.http_request.headers_mut().insert(AUTHORIZATION, value);
        self.signed = true;
    }

    /// Check if the `Authorization` header was set by a signing handler.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Signal that resolves when the request must stop.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Time the request started sending.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Run the request through its handlers.
    ///
    /// The build stage runs once. Sign, send and validate run once per
    /// attempt; a failed attempt runs the after-retry handlers and is retried
    /// while the error is retryable and retries are left. Complete handlers
    /// always run last.
    pub async fn send(&mut self) -> Result<()> {
        if self.sent {
            return Err(Error::request_invalid("request already sent"));
        }
        self.sent = true;
        self.started_at = Instant::now();

        self.run(Stage::Build).await;
        if self.error.is_none() {
            self.attempt().await;
        }
        self.run(Stage::Complete).await;

        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn attempt(&mut self) {
        loop {
            self.run(Stage::Sign).await;
            if self.error.is_some() {
                return;
            }

            self.run(Stage::Send).await;
            if self.error.is_none() {
                self.run(Stage::ValidateResponse).await;
            }

            if self.error.is_none() {
                self.run(Stage::Unmarshal).await;
                return;
            }

            self.run(Stage::AfterRetry).await;
            if !self.will_retry() {
                return;
            }

            let delay = self.retryer.retry_delay(self);
            if let Some(err) = &self.error {
                warn!(
                    "{}/{} attempt {} failed, retrying in {delay:?}: {err}",
                    self.operation.service_name,
                    self.operation.name,
                    self.retry_count + 1,
                );
            }
            self.retry_count += 1;
            self.error = None;
            self.retryable = None;
            self.http_response = None;
            if std::mem::take(&mut self.signed) {
                self.http_request.headers_mut().remove(AUTHORIZATION);
            }

            let cancel = self.cancel.clone();
            tokio::select! {
                biased;
                err = cancel.wait() => {
                    self.error = Some(err);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn will_retry(&self) -> bool {
        let Some(err) = &self.error else {
            return false;
        };
        if err.is_cancelled() {
            return false;
        }

        let retryable = self.retryable.unwrap_or_else(|| err.is_retryable());
        retryable && self.retry_count < self.retryer.max_retries()
    }

    async fn run(&mut self, stage: Stage) {
        debug!(
            "{}/{} running {stage:?} handlers",
            self.operation.service_name, self.operation.name
        );
        let list = self.handlers.stage(stage).clone();
        list.run(self).await;
    }
}

impl Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("operation", &self.operation)
            .field("retry_count", &self.retry_count)
            .field("error", &self.error)
            .field("sent", &self.sent)
            .finish()
    }
}

/// Copy an outbound request so each attempt can hand one to the transport.
pub fn clone_http_request(req: &http::Request<Bytes>) -> http::Request<Bytes> {
    let mut out = http::Request::new(req.body().clone());
    *out.method_mut() = req.method().clone();
    *out.uri_mut() = req.uri().clone();
    *out.version_mut() = req.version();
    *out.headers_mut() = req.headers().clone();
    out
}

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

//! Default handlers every request runs unless a client replaces them.

use crate::constants::*;
use crate::handlers::{Handler, Handlers, NamedHandler};
use crate::hash::base64_url_hmac_sha1;
use crate::request::{clone_http_request, Body};
use crate::{Error, ErrorKind, Request};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method, StatusCode, Uri};
use log::{debug, warn};

/// Name of [`url_handler`].
pub const URL_HANDLER: &str = "core.UrlHandler";
/// Name of [`user_agent_handler`].
pub const USER_AGENT_HANDLER: &str = "core.UserAgentHandler";
/// Name of [`body_handler`].
pub const BODY_HANDLER: &str = "core.BodyHandler";
/// Name of [`content_length_handler`].
pub const CONTENT_LENGTH_HANDLER: &str = "core.ContentLengthHandler";
/// Name of [`qbox_sign_handler`].
pub const QBOX_SIGN_HANDLER: &str = "core.QBoxSignHandler";
/// Name of [`send_handler`].
pub const SEND_HANDLER: &str = "core.SendHandler";
/// Name of [`validate_response_handler`].
pub const VALIDATE_RESPONSE_HANDLER: &str = "core.ValidateResponseHandler";
/// Name of [`unmarshal_handler`].
pub const UNMARSHAL_HANDLER: &str = "core.UnmarshalHandler";
/// Name of [`after_retry_handler`].
pub const AFTER_RETRY_HANDLER: &str = "core.AfterRetryHandler";
/// Name of [`complete_handler`].
pub const COMPLETE_HANDLER: &str = "core.CompleteHandler";

/// Handlers with every default handler installed in its stage.
pub fn default_handlers() -> Handlers {
    let mut handlers = Handlers::default();

    handlers.build.push_back(url_handler());
    handlers.build.push_back(user_agent_handler());
    handlers.build.push_back(body_handler());
    handlers.sign.push_back(content_length_handler());
    handlers.sign.push_back(qbox_sign_handler());
    handlers.send.push_back(send_handler());
    handlers.validate_response.push_back(validate_response_handler());
    handlers.unmarshal.push_back(unmarshal_handler());
    handlers.after_retry.push_back(after_retry_handler());
    handlers.complete.push_back(complete_handler());

    handlers
}

/// User agent sent by default.
pub fn default_user_agent() -> String {
    format!(
        "qiniu-sdk-rust/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Compose the request URI from the operation's host and path.
///
/// Hosts without a scheme are reached over `https`.
pub fn url_handler() -> NamedHandler {
    NamedHandler::from_fn(URL_HANDLER, |req| {
        let op = req.operation();
        if op.host.is_empty() {
            let err = Error::config_invalid(format!("host of {} is not configured", op.name));
            req.set_error(err);
            return;
        }

        let host = op.host.trim_end_matches('/');
        let scheme = if host.contains("://") { "" } else { "https://" };
        let sep = if op.path.starts_with('/') || op.path.is_empty() {
            ""
        } else {
            "/"
        };
        let url = format!("{scheme}{host}{sep}{}", op.path);

        match url.parse::<Uri>() {
            Ok(uri) => *req.http_request_mut().uri_mut() = uri,
            Err(e) => req.set_error(
                Error::request_invalid(format!("invalid request url: {url}")).with_source(e),
            ),
        }
    })
}

/// Set the `User-Agent` header unless one is present.
pub fn user_agent_handler() -> NamedHandler {
    NamedHandler::from_fn(USER_AGENT_HANDLER, |req| {
        let headers = req.http_request_mut().headers_mut();
        if headers.contains_key(USER_AGENT) {
            return;
        }
        if let Ok(ua) = HeaderValue::from_str(&default_user_agent()) {
            headers.insert(USER_AGENT, ua);
        }
    })
}

/// Encode the input body and set its content type.
pub fn body_handler() -> NamedHandler {
    NamedHandler::from_fn(BODY_HANDLER, |req| {
        let (content, derived) = match req.body() {
            Body::Empty => (Bytes::new(), None),
            Body::Raw(bs) => (bs.clone(), None),
            Body::Json(v) => match serde_json::to_vec(v) {
                Ok(bs) => (Bytes::from(bs), Some(CONTENT_TYPE_JSON)),
                Err(e) => {
                    req.set_error(Error::request_invalid("failed to encode json body").with_source(e));
                    return;
                }
            },
            Body::Form(pairs) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish();
                (Bytes::from(encoded), Some(CONTENT_TYPE_FORM))
            }
        };

        let content_type = req
            .operation()
            .content_type
            .clone()
            .or_else(|| derived.map(str::to_string));

        if let Some(ct) = content_type {
            match HeaderValue::from_str(&ct) {
                Ok(v) => {
                    req.http_request_mut().headers_mut().insert(CONTENT_TYPE, v);
                }
                Err(e) => {
                    req.set_error(Error::request_invalid("invalid content type").with_source(e));
                    return;
                }
            }
        }
        *req.http_request_mut().body_mut() = content;
    })
}

/// Set `Content-Length` for requests carrying a body.
pub fn content_length_handler() -> NamedHandler {
    NamedHandler::from_fn(CONTENT_LENGTH_HANDLER, |req| {
        let http_req = req.http_request_mut();
        let len = http_req.body().len();
        let needs_body = matches!(*http_req.method(), Method::POST | Method::PUT | Method::PATCH);
        if len > 0 || needs_body {
            http_req
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
    })
}

/// Sign the request with QBox authorization when credentials are attached.
pub fn qbox_sign_handler() -> NamedHandler {
    NamedHandler::new(QBOX_SIGN_HANDLER, QBoxSignHandler)
}

struct QBoxSignHandler;

#[async_trait::async_trait]
impl Handler for QBoxSignHandler {
    async fn handle(&self, req: &mut Request<'_>) {
        if req.http_request().headers().contains_key(AUTHORIZATION) {
            return;
        }
        let Some(credentials) = req.credentials().cloned() else {
            return;
        };

        let cred = match credentials.get().await {
            Ok(cred) => cred,
            Err(e) => {
                req.set_error(e);
                return;
            }
        };

        let token = qbox_token(&cred.access_key, &cred.secret_key, req.http_request());
        match HeaderValue::from_str(&format!("{QBOX_AUTHORIZATION_PREFIX} {token}")) {
            Ok(v) => req.set_signature(v),
            Err(e) => req.set_error(Error::request_invalid("invalid authorization").with_source(e)),
        }
    }
}

/// Compute the QBox token `<ak>:<base64url(hmac_sha1(sk, data))>` for a request.
///
/// `data` is the path, `?query` if present, a newline, then the body when
/// it is form encoded.
pub fn qbox_token(access_key: &str, secret_key: &str, req: &http::Request<Bytes>) -> String {
    let mut data = req.uri().path().as_bytes().to_vec();
    if let Some(query) = req.uri().query() {
        data.push(b'?');
        data.extend_from_slice(query.as_bytes());
    }
    data.push(b'\n');

    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == CONTENT_TYPE_FORM);
    if is_form {
        data.extend_from_slice(req.body());
    }

    let sign = base64_url_hmac_sha1(secret_key.as_bytes(), &data);
    format!("{access_key}:{sign}")
}

/// Hand the request to the context's transport.
pub fn send_handler() -> NamedHandler {
    NamedHandler::new(SEND_HANDLER, SendHandler)
}

struct SendHandler;

#[async_trait::async_trait]
impl Handler for SendHandler {
    async fn handle(&self, req: &mut Request<'_>) {
        let cancel = req.cancel_signal();
        let ctx = req.ctx().clone();
        let http_req = clone_http_request(req.http_request());
        // Query strings may carry secrets, only log the path.
        debug!(
            "sending request: {} {}{}",
            http_req.method(),
            http_req.uri().host().unwrap_or_default(),
            http_req.uri().path()
        );

        let result = tokio::select! {
            biased;
            err = cancel.wait() => Err(err),
            resp = ctx.http_send(http_req) => resp.map_err(|e| match e.kind() {
                ErrorKind::Network | ErrorKind::Cancelled => e,
                _ => Error::network("failed to send request").with_source(e),
            }),
        };

        match result {
            Ok(resp) => req.set_http_response(resp),
            Err(err) => req.set_error(err),
        }
    }
}

/// Turn non-2xx responses into errors.
pub fn validate_response_handler() -> NamedHandler {
    NamedHandler::from_fn(VALIDATE_RESPONSE_HANDLER, |req| {
        let Some(resp) = req.http_response() else {
            req.set_error(Error::unexpected("no response to validate"));
            return;
        };

        let status = resp.status();
        if status.is_success() {
            return;
        }
        let message = error_message(status, resp.body());

        if status == StatusCode::UNAUTHORIZED {
            if let Some(credentials) = req.credentials() {
                credentials.expire();
            }
        }
        req.set_error(Error::http_status(status, message));
    })
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_slice(body) {
        for key in ["error", "message", "error_description"] {
            if let Some(serde_json::Value::String(msg)) = obj.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        text.to_string()
    }
}

/// Decode JSON responses into the request's decode target.
pub fn unmarshal_handler() -> NamedHandler {
    NamedHandler::from_fn(UNMARSHAL_HANDLER, |req| {
        if !req.has_data() {
            return;
        }
        let Some(resp) = req.http_response() else {
            return;
        };

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        if !mime.eq_ignore_ascii_case(CONTENT_TYPE_JSON) || resp.body().is_empty() {
            return;
        }

        let mime = mime.to_string();
        let body = resp.body().clone();
        if let Err(e) = req.decode_data(&body) {
            req.set_error(
                Error::deserialization(format!("failed to decode data with content-type: {mime}"))
                    .with_source(e),
            );
        }
    })
}

/// Fill the retryable hint from the retryer when no handler set one.
pub fn after_retry_handler() -> NamedHandler {
    NamedHandler::from_fn(AFTER_RETRY_HANDLER, |req| {
        if req.retryable().is_some() {
            return;
        }
        let retryer = req.retryer().clone();
        let retryable = retryer.should_retry(req);
        req.set_retryable(retryable);
    })
}

/// Log the outcome of the request.
pub fn complete_handler() -> NamedHandler {
    NamedHandler::from_fn(COMPLETE_HANDLER, |req| {
        let op = req.operation();
        let status = req
            .http_response()
            .map(|resp| resp.status().as_u16().to_string())
            .unwrap_or_else(|| "-".to_string());
        let elapsed = req.started_at().elapsed();

        match req.error() {
            Some(err) => warn!(
                "{}/{} failed: status={status} retries={} elapsed={elapsed:?}: {err}",
                op.service_name,
                op.name,
                req.retry_count()
            ),
            None => debug!(
                "{}/{} finished: status={status} retries={} elapsed={elapsed:?}",
                op.service_name,
                op.name,
                req.retry_count()
            ),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Operation};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    async fn build(op: Operation, body: Body) -> Request<'static> {
        let mut handlers = Handlers::default();
        handlers.build.push_back(url_handler());
        handlers.build.push_back(user_agent_handler());
        handlers.build.push_back(body_handler());
        handlers.sign.push_back(content_length_handler());

        let mut req = Request::new(Context::new(), handlers, op).with_body(body);
        req.send().await.unwrap();
        req
    }

    #[test_case("acc.qbox.me", "/oauth2/token", "https://acc.qbox.me/oauth2/token"; "default scheme")]
    #[test_case("http://127.0.0.1:8080/", "/user/info", "http://127.0.0.1:8080/user/info"; "trailing slash")]
    #[test_case("https://api.qiniu.com", "api/developer/1/overview", "https://api.qiniu.com/api/developer/1/overview"; "relative path")]
    #[tokio::test]
    async fn test_url_handler(host: &str, path: &str, expected: &str) {
        let req = build(Operation::get(host, path), Body::Empty).await;
        assert_eq!(req.http_request().uri().to_string(), expected);
        assert!(req.http_request().headers().contains_key(USER_AGENT));
    }

    #[tokio::test]
    async fn test_url_handler_empty_host() {
        let mut handlers = Handlers::default();
        handlers.build.push_back(url_handler());

        let mut req = Request::new(Context::new(), handlers, Operation::get("", "/"));
        let err = req.send().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_body_handler_form() {
        let req = build(
            Operation::post("acc.qbox.me", "/user/info"),
            Body::form([("access_token", "a b&c")]),
        )
        .await;

        let http_req = req.http_request();
        assert_eq!(http_req.body().as_ref(), b"access_token=a+b%26c");
        assert_eq!(http_req.headers()[CONTENT_TYPE], CONTENT_TYPE_FORM);
        assert_eq!(http_req.headers()[CONTENT_LENGTH], "20");
    }

    #[tokio::test]
    async fn test_body_handler_json_with_override() {
        let req = build(
            Operation::post("gaea.qiniu.io", "/api/order/new")
                .with_content_type("application/json; charset=utf-8"),
            Body::json(&serde_json::json!({"memo": "x"})).unwrap(),
        )
        .await;

        let http_req = req.http_request();
        assert_eq!(http_req.body().as_ref(), br#"{"memo":"x"}"#);
        assert_eq!(
            http_req.headers()[CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_content_length_skipped_for_empty_get() {
        let req = build(Operation::get("uc.qbox.me", "/buckets"), Body::Empty).await;
        assert!(!req.http_request().headers().contains_key(CONTENT_LENGTH));
    }

    #[test]
    fn test_qbox_token() {
        let mut req = http::Request::new(Bytes::from_static(b"name=test&language=go"));
        *req.uri_mut() = "http://rs.qbox.me/move/bucket:key?force=true".parse().unwrap();
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));

        let data = b"/move/bucket:key?force=true\nname=test&language=go";
        let expected = format!("ak:{}", base64_url_hmac_sha1(b"sk", data));
        assert_eq!(qbox_token("ak", "sk", &req), expected);

        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        let expected = format!(
            "ak:{}",
            base64_url_hmac_sha1(b"sk", b"/move/bucket:key?force=true\n")
        );
        assert_eq!(qbox_token("ak", "sk", &req), expected);
    }

    #[test_case(br#"{"error": "bad token"}"#, "bad token"; "error key")]
    #[test_case(br#"{"message": "not allowed"}"#, "not allowed"; "message key")]
    #[test_case(br#"{"error_description": "expired"}"#, "expired"; "description key")]
    #[test_case(b"plain failure\n", "plain failure"; "raw text")]
    #[test_case(b"", "Bad Request"; "empty body")]
    fn test_error_message(body: &[u8], expected: &str) {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, body), expected);
    }
}

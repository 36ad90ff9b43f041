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

//! Admin service tests driven by a routing mock transport.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::TimeZone;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use pretty_assertions::assert_eq;
use qiniu_admin::models::{ReqOrderNew, ReqProductOrderAccomplish, ReqProductOrderNew};
use qiniu_admin::{send_email, Config, Email, Service};
use qiniu_core::corehandlers::qbox_token;
use qiniu_core::{Client, Context, DefaultRetryer, ErrorKind, HttpSend, Result};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Route = dyn Fn(&http::Request<Bytes>) -> (StatusCode, String) + Send + Sync;

/// Mock transport answering through a route function.
#[derive(Clone)]
struct MockHttpSend {
    route: Arc<Route>,
    delay: Duration,
    seen: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl Debug for MockHttpSend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHttpSend")
            .field("delay", &self.delay)
            .finish()
    }
}

impl MockHttpSend {
    fn new(route: impl Fn(&http::Request<Bytes>) -> (StatusCode, String) + Send + Sync + 'static) -> Self {
        Self {
            route: Arc::new(route),
            delay: Duration::ZERO,
            seen: Arc::default(),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn requests(&self) -> Vec<http::Request<Bytes>> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(qiniu_core::clone_http_request)
            .collect()
    }

    fn count(&self, grant_type: &str) -> usize {
        let needle = format!("grant_type={grant_type}");
        self.requests()
            .iter()
            .filter(|r| r.uri().query().is_some_and(|q| q.contains(&needle)))
            .count()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let (status, body) = (self.route)(&req);
        self.seen.lock().unwrap().push(req);

        let mut resp = http::Response::new(Bytes::from(body));
        *resp.status_mut() = status;
        resp.headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        Ok(resp)
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> Config {
    Config {
        acc_host: Some("acc.test".to_string()),
        trade_host: Some("trade.test".to_string()),
        gaea_host: Some("gaea.test".to_string()),
        api_host: Some("api.test".to_string()),
        sso_host: Some("sso.test".to_string()),
        morse_host: Some("morse.test".to_string()),
        uc_host: Some("uc.test".to_string()),
        ..Default::default()
    }
    .with_account("admin@qiniu.com", "passw0rd")
}

fn service(mock: &MockHttpSend, config: Config) -> Service {
    service_with_retries(mock, config, 0)
}

fn service_with_retries(mock: &MockHttpSend, config: Config, max_retries: u32) -> Service {
    let client = Client::new(
        Context::new().with_http_send(mock.clone()),
        qiniu_core::Config::default().with_keys("ak", "sk"),
    )
    .with_retryer(
        DefaultRetryer::new()
            .with_max_retries(max_retries)
            .with_min_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO),
    );
    Service::new(client, config)
}

const DEVELOPER: &str = r#"{"code":200,"data":{"uid":1,"email":"dev@qiniu.com"}}"#;

fn developer_auth(mock: &MockHttpSend) -> Vec<String> {
    mock.requests()
        .iter()
        .filter(|r| r.uri().path() == "/api/developer")
        .map(|r| header(r, AUTHORIZATION).to_string())
        .collect()
}

fn token_json(access_token: &str, refresh_token: &str, expires_in: i64) -> String {
    serde_json::json!({
        "access_token": access_token,
        "token_type": "bearer",
        "refresh_token": refresh_token,
        "expires_in": expires_in,
    })
    .to_string()
}

fn is_grant(req: &http::Request<Bytes>, grant_type: &str) -> bool {
    req.uri().path() == "/oauth2/token"
        && req
            .uri()
            .query()
            .is_some_and(|q| q.contains(&format!("grant_type={grant_type}")))
}

fn header<'a>(req: &'a http::Request<Bytes>, name: impl http::header::AsHeaderName) -> &'a str {
    req.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_token_shared_by_concurrent_callers() {
    init();
    let mock = MockHttpSend::new(|req| {
        assert!(is_grant(req, "password"), "unexpected request {}", req.uri());
        (StatusCode::OK, token_json("at1", "rt1", 3600))
    })
    .with_delay(Duration::from_millis(20));
    let svc = service(&mock, config());

    let (a, b, c) = tokio::join!(svc.token(), svc.token(), svc.token());
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(a.access_token, "at1");
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(mock.count("password"), 1);

    // Served from cache.
    assert_eq!(svc.token().await.unwrap().access_token, "at1");
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn test_password_grant_request() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, token_json("at1", "rt1", 3600)));
    let svc = service(&mock, config());

    let token = svc.token().await.unwrap();
    assert!(token.is_valid());
    assert_eq!(token.kind(), "Bearer");

    let reqs = mock.requests();
    let req = &reqs[0];
    assert_eq!(req.method(), http::Method::POST);
    assert_eq!(req.uri().host(), Some("acc.test"));
    assert_eq!(
        req.uri().query(),
        Some("grant_type=password&username=admin%40qiniu.com&password=passw0rd")
    );
    assert!(!req.headers().contains_key(AUTHORIZATION));
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    init();
    let mock = MockHttpSend::new(|req| {
        if is_grant(req, "refresh_token") {
            (StatusCode::OK, token_json("at2", "rt2", 3600))
        } else {
            (StatusCode::OK, token_json("at1", "rt1", 0))
        }
    });
    let svc = service(&mock, config());

    assert_eq!(svc.token().await.unwrap().access_token, "at1");
    assert_eq!(svc.token().await.unwrap().access_token, "at2");
    assert_eq!(svc.token().await.unwrap().access_token, "at2");

    assert_eq!(mock.count("password"), 1);
    assert_eq!(mock.count("refresh_token"), 1);
    let reqs = mock.requests();
    assert_eq!(
        reqs[1].uri().query(),
        Some("grant_type=refresh_token&refresh_token=rt1")
    );
}

#[tokio::test]
async fn test_refresh_failure_falls_back_to_password() {
    init();
    let issued = Arc::new(AtomicUsize::new(0));
    let counter = issued.clone();
    let mock = MockHttpSend::new(move |req| {
        if is_grant(req, "refresh_token") {
            return (
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant"}"#.to_string(),
            );
        }
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => (StatusCode::OK, token_json("at1", "rt1", 0)),
            _ => (StatusCode::OK, token_json("at3", "rt3", 3600)),
        }
    });
    let svc = service(&mock, config());

    assert_eq!(svc.token().await.unwrap().access_token, "at1");
    assert_eq!(svc.token().await.unwrap().access_token, "at3");

    assert_eq!(mock.count("refresh_token"), 1);
    assert_eq!(mock.count("password"), 2);
    assert_eq!(issued.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_grant_keeps_cached_token() {
    init();
    let failing = Arc::new(AtomicBool::new(false));
    let flag = failing.clone();
    let mock = MockHttpSend::new(move |req| {
        if is_grant(req, "refresh_token") {
            return (
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant"}"#.to_string(),
            );
        }
        if flag.load(Ordering::SeqCst) {
            (
                StatusCode::UNAUTHORIZED,
                r#"{"error":"bad password"}"#.to_string(),
            )
        } else {
            (StatusCode::OK, token_json("at1", "rt1", 0))
        }
    });
    let svc = service(&mock, config());

    svc.token().await.unwrap();

    failing.store(true, Ordering::SeqCst);
    let err = svc.token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(err.to_string(), "bad password");

    // The refresh token of the cached token is tried again.
    failing.store(false, Ordering::SeqCst);
    svc.token().await.unwrap();
    assert_eq!(mock.count("refresh_token"), 2);
    assert!(mock
        .requests()
        .iter()
        .filter(|r| is_grant(r, "refresh_token"))
        .all(|r| r.uri().query().unwrap().ends_with("refresh_token=rt1")));
}

#[tokio::test]
async fn test_token_without_account() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, token_json("at1", "rt1", 3600)));
    let svc = service(
        &mock,
        Config {
            username: None,
            ..config()
        },
    );

    let err = svc.token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(err.to_string(), "username, password, acc_host cannot be empty");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_token_response_without_access_token() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, r#"{"expires_in":3600}"#.to_string()));
    let svc = service(&mock, config());

    let err = svc.token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Deserialization);
}

#[tokio::test]
async fn test_get_developer_carries_bearer_token() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        "/api/developer" => (
            StatusCode::OK,
            r#"{"code":200,"message":"","data":{"uid":1380000000,"email":"dev@qiniu.com","fullName":"Dev","mobileBinded":true}}"#
                .to_string(),
        ),
        path => panic!("unexpected path {path}"),
    });
    let svc = service(&mock, config());

    let dev = svc.get_developer(1380000000).await.unwrap();
    assert_eq!(dev.uid, 1380000000);
    assert_eq!(dev.email, "dev@qiniu.com");
    assert_eq!(dev.full_name, "Dev");
    assert!(dev.mobile_binded);

    let reqs = mock.requests();
    let req = reqs.last().unwrap();
    assert_eq!(req.uri().host(), Some("gaea.test"));
    assert_eq!(req.uri().query(), Some("uid=1380000000"));
    assert_eq!(header(req, AUTHORIZATION), "Bearer at1");
}

#[tokio::test]
async fn test_get_user() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        "/api/user" => (
            StatusCode::OK,
            r#"{"code":200,"data":{"Id":"5","Name":"sales","QQ":"10000","sf_sales_id":"sf-1"}}"#
                .to_string(),
        ),
        path => panic!("unexpected path {path}"),
    });
    let svc = service(&mock, config());

    let user = svc.get_user("sf 1").await.unwrap();
    assert_eq!(user.id, "5");
    assert_eq!(user.qq, "10000");
    assert_eq!(user.sf_sales_id, "sf-1");
    assert_eq!(
        mock.requests().last().unwrap().uri().query(),
        Some("salesId=sf+1")
    );
}

#[tokio::test]
async fn test_developer_info_escapes_path() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        _ => (
            StatusCode::OK,
            r#"{"uid":7,"email":"dev@qiniu.com","fullname":"Dev","is_enterprise":true}"#
                .to_string(),
        ),
    });
    let svc = service(&mock, config());

    let info = svc.developer_info_email("dev@qiniu.com").await.unwrap();
    assert_eq!(info.uid, 7);
    assert_eq!(info.full_name, "Dev");
    assert!(info.is_enterprise);
    svc.developer_info_uid(7).await.unwrap();

    let paths: Vec<String> = mock
        .requests()
        .iter()
        .filter(|r| r.uri().host() == Some("api.test"))
        .map(|r| r.uri().path().to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/developer/dev@qiniu.com/overview",
            "/api/developer/7/overview"
        ]
    );
}

#[tokio::test]
async fn test_products() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        "/seller/product" => (StatusCode::OK, r#"[{"id":1,"name":"kodo"}]"#.to_string()),
        path => panic!("unexpected path {path}"),
    });
    let svc = service(&mock, config());

    let mut out = serde_json::Value::Null;
    svc.products(7, &mut out).await.unwrap();
    assert_eq!(out, serde_json::json!([{"id": 1, "name": "kodo"}]));

    let reqs = mock.requests();
    let req = reqs.last().unwrap();
    assert_eq!(req.uri().host(), Some("trade.test"));
    assert_eq!(req.uri().query(), Some("seller_id=7&status=2&page_size=20"));
    assert_eq!(header(req, AUTHORIZATION), "Bearer at1");
}

#[tokio::test]
async fn test_products_without_trade_host() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, token_json("at1", "rt1", 3600)));
    let svc = service(
        &mock,
        Config {
            trade_host: None,
            ..config()
        },
    );

    let mut out = serde_json::Value::Null;
    let err = svc.products(7, &mut out).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert_eq!(err.to_string(), "trade host cannot be empty");
    assert!(mock.requests().is_empty());
    assert_eq!(out, serde_json::Value::Null);
}

#[tokio::test]
async fn test_product_order_accomplish() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        _ => (StatusCode::OK, r#"{"code":200}"#.to_string()),
    });
    let svc = service(&mock, config());

    let input = ReqProductOrderAccomplish {
        id: 12,
        property: "{}".to_string(),
        start_time: chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        force: true,
    };
    let mut out = serde_json::Value::Null;
    svc.product_order_accomplish(&input, &mut out).await.unwrap();
    assert_eq!(out["code"], 200);

    let reqs = mock.requests();
    let req = reqs.last().unwrap();
    assert_eq!(req.uri().path(), "/product/order/accomplish");
    assert_eq!(
        header(req, CONTENT_TYPE),
        "application/x-www-form-urlencoded"
    );
    let body = String::from_utf8(req.body().to_vec()).unwrap();
    assert!(body.starts_with("id=12&property=%7B%7D&start_time=2024-01-02T03%3A04%3A05"));
    assert!(body.ends_with("&force=true"));
}

#[tokio::test]
async fn test_create_order() {
    init();
    let mock = MockHttpSend::new(|req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        "/api/order/new" => (
            StatusCode::OK,
            r#"{"code":200,"data":{"order_hash":"abc"}}"#.to_string(),
        ),
        path => panic!("unexpected path {path}"),
    });
    let svc = service(&mock, config());

    let input = ReqOrderNew {
        buyer_id: 1380000000,
        memo: String::new(),
        orders: vec![ReqProductOrderNew {
            product_id: 3,
            duration: 1,
            quantity: 2,
            ..Default::default()
        }],
    };
    let mut out = qiniu_admin::models::OrderNewResponse::default();
    svc.create_order(&input, &mut out).await.unwrap();
    assert_eq!(out.data.order, "abc");

    let reqs = mock.requests();
    let body: serde_json::Value = serde_json::from_slice(reqs.last().unwrap().body()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "uid": 1380000000,
            "orders": [{"product_id": 3, "duration": 1, "quantity": 2}],
        })
    );
}

#[tokio::test]
async fn test_qualified_access_token() {
    init();
    let mock = MockHttpSend::new(|req| {
        let body = String::from_utf8(req.body().to_vec()).unwrap();
        let info = if body == "access_token=admin-token" {
            r#"{"uid":1,"userid":"admin","is_activated":true,"user_type":1}"#
        } else {
            r#"{"uid":2,"userid":"user","is_activated":true,"user_type":4}"#
        };
        (StatusCode::OK, info.to_string())
    });
    let svc = service(&mock, config());

    let (ok, info) = svc.qualified_access_token("admin-token").await.unwrap();
    assert!(ok);
    assert_eq!(info.unwrap().user_id, "admin");

    let (ok, info) = svc.qualified_access_token("user-token").await.unwrap();
    assert!(!ok);
    assert_eq!(info, None);

    let reqs = mock.requests();
    assert_eq!(reqs[0].uri().path(), "/user/info");
    assert!(!reqs[0].headers().contains_key(AUTHORIZATION));
}

#[tokio::test]
async fn test_login_required() {
    init();
    let mock = MockHttpSend::new(|_| {
        (
            StatusCode::OK,
            r#"{"uid":1,"email":"a@qiniu.com","name":"a","login_token":"lt"}"#.to_string(),
        )
    });
    let svc = service(&mock, config());

    let info = svc.login_required("portal", "").await.unwrap();
    assert_eq!(info.login_token, "lt");
    svc.login_required("portal", "lt").await.unwrap();

    let queries: Vec<String> = mock
        .requests()
        .iter()
        .map(|r| r.uri().query().unwrap().to_string())
        .collect();
    assert_eq!(
        queries,
        vec!["client_id=portal", "client_id=portal&login_token=lt"]
    );
}

#[tokio::test]
async fn test_send_email() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, "{}".to_string()));
    let svc = service(
        &mock,
        Config {
            email_client_id: Some("portal".to_string()),
            ..config()
        },
    );

    let email = Email {
        subject: " quota ".to_string(),
        to: vec!["ops@qiniu.com".to_string()],
        message: "reached".to_string(),
        uid: 1,
        ..Default::default()
    };
    send_email(&svc, &email).await.unwrap();

    let reqs = mock.requests();
    let req = &reqs[0];
    assert_eq!(req.uri().path(), "/api/notification/send/mail");
    assert_eq!(header(req, "client-id"), "portal");
    assert_eq!(header(req, CONTENT_TYPE), "application/json");
    let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
    assert_eq!(body["subject"], "quota");
    assert_eq!(body["content"], "reached");
}

#[tokio::test]
async fn test_send_invalid_email() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, "{}".to_string()));
    let svc = service(&mock, config());

    let err = send_email(&svc, &Email::default()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert_eq!(err.to_string(), "email subject empty");
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_buckets_are_signed() {
    init();
    let mock = MockHttpSend::new(|_| (StatusCode::OK, r#"["photos","logs"]"#.to_string()));
    let svc = service(&mock, config());

    assert_eq!(svc.buckets().await.unwrap(), vec!["photos", "logs"]);

    let reqs = mock.requests();
    let req = &reqs[0];
    assert_eq!(req.uri().host(), Some("uc.test"));
    assert_eq!(
        header(req, AUTHORIZATION),
        format!("QBox {}", qbox_token("ak", "sk", req))
    );
}

#[tokio::test]
async fn test_admin_retry_reuses_cached_token() {
    init();
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = failures.clone();
    let mock = MockHttpSend::new(move |req| match req.uri().path() {
        "/oauth2/token" => (StatusCode::OK, token_json("at1", "rt1", 3600)),
        _ if counter.fetch_add(1, Ordering::SeqCst) == 0 => (
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error":"busy"}"#.to_string(),
        ),
        _ => (StatusCode::OK, DEVELOPER.to_string()),
    });
    let svc = service_with_retries(&mock, config(), 2);

    assert_eq!(svc.get_developer(1).await.unwrap().email, "dev@qiniu.com");
    assert_eq!(developer_auth(&mock), vec!["Bearer at1", "Bearer at1"]);
    assert_eq!(mock.count("password"), 1);
}

#[tokio::test]
async fn test_unauthorized_admin_call_signs_again_with_fresh_token() {
    init();
    let mock = MockHttpSend::new(|req| {
        if is_grant(req, "refresh_token") {
            return (StatusCode::OK, token_json("at2", "rt2", 3600));
        }
        if is_grant(req, "password") {
            return (StatusCode::OK, token_json("at1", "rt1", 3600));
        }
        match header(req, AUTHORIZATION) {
            "Bearer at1" => (
                StatusCode::UNAUTHORIZED,
                r#"{"error":"token revoked"}"#.to_string(),
            ),
            _ => (StatusCode::OK, DEVELOPER.to_string()),
        }
    });
    let svc = service_with_retries(&mock, config(), 1);

    assert_eq!(svc.get_developer(1).await.unwrap().uid, 1);
    assert_eq!(developer_auth(&mock), vec!["Bearer at1", "Bearer at2"]);
    assert_eq!(mock.count("password"), 1);
    assert_eq!(mock.count("refresh_token"), 1);
    assert_eq!(svc.token().await.unwrap().access_token, "at2");
}

#[tokio::test]
async fn test_unauthorized_admin_call_expires_cached_token() {
    init();
    let mock = MockHttpSend::new(|req| {
        if is_grant(req, "refresh_token") {
            return (StatusCode::OK, token_json("at2", "rt2", 3600));
        }
        if is_grant(req, "password") {
            return (StatusCode::OK, token_json("at1", "rt1", 3600));
        }
        (
            StatusCode::UNAUTHORIZED,
            r#"{"error":"token revoked"}"#.to_string(),
        )
    });
    let svc = service(&mock, config());

    let err = svc.get_developer(1).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(developer_auth(&mock), vec!["Bearer at1"]);

    // The rejected token is not served again.
    assert_eq!(svc.token().await.unwrap().access_token, "at2");
    assert_eq!(mock.count("refresh_token"), 1);
}

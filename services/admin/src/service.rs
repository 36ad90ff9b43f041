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

use crate::constants::*;
use crate::email::{Email, Emailer};
use crate::models::*;
use crate::{Config, Token};
use http::header::AUTHORIZATION;
use http::{HeaderName, HeaderValue, Method, StatusCode};
use log::{debug, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use qiniu_core::time::format_rfc3339;
use qiniu_core::{
    Body, Client, Context, DecodeTarget, Error, Handler, NamedHandler, Operation, Request, Result,
};
use std::fmt::{self, Debug};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Characters escaped in a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Service is the entry of the admin APIs.
///
/// APIs acting on behalf of the admin account share one OAuth2 token. The
/// token is fetched on first use and refreshed once expired; concurrent
/// callers wait for a single exchange and all receive its result.
///
/// The token is attached by the sign stage of every attempt, so a retried
/// call carries the token in effect at that time. A `401` marks the token it
/// carried as expired and is retried once.
pub struct Service {
    client: Client,
    config: Config,
    tokens: Arc<TokenCache>,
}

impl Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish()
    }
}

impl Service {
    /// Create a service on top of a client.
    pub fn new(client: Client, config: Config) -> Self {
        let tokens = Arc::new(TokenCache {
            client: client.clone(),
            config: config.clone(),
            cached: Mutex::new(None),
        });
        Self {
            client,
            config,
            tokens,
        }
    }

    /// Create a service with both client and service config loaded from env.
    pub fn from_env(ctx: Context) -> Self {
        let core = qiniu_core::Config::default().from_env(&ctx);
        let config = Config::default().from_env(&ctx);
        Self::new(Client::new(ctx, core), config)
    }

    /// Client requests are created from.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Config of this service.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the admin token, fetching a new one when needed.
    ///
    /// An expired token is refreshed with its refresh token first; when that
    /// fails the password grant is used. The cached token is only replaced by
    /// a successful exchange.
    pub async fn token(&self) -> Result<Token> {
        self.tokens.token().await
    }

    /// Exchange an account's username and password for a token.
    pub async fn password_credentials_token(&self, username: &str, password: &str) -> Result<Token> {
        self.tokens.password_credentials_token(username, password).await
    }

    /// Exchange a refresh token for a new token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Token> {
        self.tokens.refresh_token(refresh_token).await
    }

    /// Look up the account an access token belongs to.
    pub async fn user_info_from_access_token(&self, access_token: &str) -> Result<UserInfo> {
        let host = required_host(Some(self.config.acc_host()), "acc")?;

        let mut info = UserInfo::default();
        self.client
            .new_request(
                operation(Method::POST, host, "/user/info", "UserInfo"),
                Body::form([("access_token", access_token)]),
            )
            .with_data(&mut info)
            .send()
            .await?;
        Ok(info)
    }

    /// Check if an access token belongs to an activated admin account.
    ///
    /// The account is returned only when it qualifies.
    pub async fn qualified_access_token(
        &self,
        access_token: &str,
    ) -> Result<(bool, Option<UserInfo>)> {
        let info = self.user_info_from_access_token(access_token).await?;
        if info.is_admin() && info.is_activated {
            Ok((true, Some(info)))
        } else {
            Ok((false, None))
        }
    }

    /// Report a delivered product order to the trade service.
    pub async fn product_order_accomplish<T: DecodeTarget>(
        &self,
        input: &ReqProductOrderAccomplish,
        out: &mut T,
    ) -> Result<()> {
        let host = required_host(self.config.trade_host.as_deref(), "trade")?;
        let body = Body::form([
            ("id", input.id.to_string()),
            ("property", input.property.clone()),
            ("start_time", format_rfc3339(input.start_time)),
            ("force", input.force.to_string()),
        ]);

        self.new_admin_request(
            operation(Method::POST, host, "/product/order/accomplish", "ProductOrderAccomplish"),
            body,
        )
        .with_data(out)
        .send()
        .await
    }

    /// List the online products of a seller.
    pub async fn products<T: DecodeTarget>(&self, seller_id: i64, out: &mut T) -> Result<()> {
        let host = required_host(self.config.trade_host.as_deref(), "trade")?;
        let seller_id = seller_id.to_string();
        let path = format!(
            "/seller/product?{}",
            encode_query(&[
                ("seller_id", seller_id.as_str()),
                ("status", "2"),
                ("page_size", "20"),
            ])
        );

        self.new_admin_request(operation(Method::GET, host, path, "Products"), Body::Empty)
            .with_data(out)
            .send()
            .await
    }

    /// Place an order for a buyer.
    pub async fn create_order<T: DecodeTarget>(&self, input: &ReqOrderNew, out: &mut T) -> Result<()> {
        let host = required_host(self.config.gaea_host.as_deref(), "gaea")?;

        self.new_admin_request(
            operation(Method::POST, host, "/api/order/new", "CreateOrder"),
            Body::json(input)?,
        )
        .with_data(out)
        .send()
        .await
    }

    /// Check an SSO login and return the logged in user.
    pub async fn login_required(&self, client_id: &str, login_token: &str) -> Result<SsoUserInfo> {
        let host = required_host(self.config.sso_host.as_deref(), "sso")?;
        let mut params = vec![("client_id", client_id)];
        if !login_token.is_empty() {
            params.push(("login_token", login_token));
        }
        let path = format!("/loginrequired?{}", encode_query(&params));

        let mut info = SsoUserInfo::default();
        self.client
            .new_request(
                operation(Method::GET, host, path, "SSOLoginRequired"),
                Body::Empty,
            )
            .with_data(&mut info)
            .send()
            .await?;
        Ok(info)
    }

    /// Developer overview looked up by uid.
    pub async fn developer_info_uid(&self, uid: u32) -> Result<DeveloperInfo> {
        self.developer_info(&uid.to_string()).await
    }

    /// Developer overview looked up by email.
    pub async fn developer_info_email(&self, email: &str) -> Result<DeveloperInfo> {
        self.developer_info(email).await
    }

    async fn developer_info(&self, id: &str) -> Result<DeveloperInfo> {
        let host = required_host(Some(self.config.api_host()), "api")?;
        let path = format!(
            "/api/developer/{}/overview",
            utf8_percent_encode(id, PATH_SEGMENT)
        );

        let mut info = DeveloperInfo::default();
        self.new_admin_request(operation(Method::GET, host, path, "DeveloperInfo"), Body::Empty)
            .with_data(&mut info)
            .send()
            .await?;
        Ok(info)
    }

    /// Developer account stored by Gaea.
    pub async fn get_developer(&self, uid: u32) -> Result<Developer> {
        let host = required_host(self.config.gaea_host.as_deref(), "gaea")?;
        let path = format!("/api/developer?uid={uid}");

        let mut resp = GaeaResponse::<Developer>::default();
        self.new_admin_request(operation(Method::GET, host, path, "GetDeveloper"), Body::Empty)
            .with_data(&mut resp)
            .send()
            .await?;
        Ok(resp.data)
    }

    /// Sales user stored by Gaea.
    pub async fn get_user(&self, sales_id: &str) -> Result<User> {
        let host = required_host(self.config.gaea_host.as_deref(), "gaea")?;
        let path = format!("/api/user?{}", encode_query(&[("salesId", sales_id)]));

        let mut resp = GaeaResponse::<User>::default();
        self.new_admin_request(operation(Method::GET, host, path, "GetUser"), Body::Empty)
            .with_data(&mut resp)
            .send()
            .await?;
        Ok(resp.data)
    }

    /// Names of the buckets owned by the credentials' account.
    pub async fn buckets(&self) -> Result<Vec<String>> {
        let host = required_host(Some(self.config.uc_host()), "uc")?;

        let mut buckets = Vec::new();
        self.client
            .new_signed_request(operation(Method::GET, host, "/buckets", "Buckets"), Body::Empty)
            .with_data(&mut buckets)
            .send()
            .await?;
        Ok(buckets)
    }

    fn new_admin_request<'a>(&self, op: Operation, body: Body) -> Request<'a> {
        let mut req = self.client.new_request(op, body);
        let handlers = req.handlers_mut();
        handlers.sign.push_front(NamedHandler::new(
            BEARER_SIGN_HANDLER,
            BearerSignHandler(self.tokens.clone()),
        ));
        handlers.validate_response.push_front(NamedHandler::new(
            EXPIRE_TOKEN_HANDLER,
            ExpireTokenHandler(self.tokens.clone()),
        ));
        handlers.after_retry.push_front(retry_unauthorized_handler());
        req
    }
}

#[async_trait::async_trait]
impl Emailer for Service {
    async fn send_email(&self, email: &Email) -> Result<()> {
        let mut email = email.clone();
        email.validate()?;
        let host = required_host(self.config.morse_host.as_deref(), "morse")?;

        let mut req = self.client.new_request(
            operation(Method::POST, host, "/api/notification/send/mail", "SendEmail"),
            Body::json(&email)?,
        );
        if let Some(client_id) = self.config.email_client_id.as_deref() {
            let value = HeaderValue::from_str(client_id)
                .map_err(|e| Error::config_invalid("invalid email client id").with_source(e))?;
            req = req.with_header(HeaderName::from_static(CLIENT_ID_HEADER), value);
        }
        req.send().await
    }
}

/// Admin token shared by a service and the handlers of its requests.
struct TokenCache {
    client: Client,
    config: Config,
    cached: Mutex<Option<Token>>,
}

impl TokenCache {
    async fn token(&self) -> Result<Token> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid()) {
            return Ok(token.clone());
        }

        let refresh_token = cached
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .filter(|v| !v.is_empty());
        if let Some(refresh_token) = refresh_token {
            match self.refresh_token(&refresh_token).await {
                Ok(token) => {
                    debug!("admin token refreshed");
                    *cached = Some(token.clone());
                    return Ok(token);
                }
                Err(err) => warn!("refresh admin token failed, fall back to password: {err}"),
            }
        }

        let username = self.config.username.as_deref().unwrap_or_default();
        let password = self.config.password.as_deref().unwrap_or_default();
        let token = self.password_credentials_token(username, password).await?;
        debug!("admin token issued by password grant");
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Expire the cached token if it is the one `sent` carried.
    async fn expire(&self, sent: &HeaderValue) {
        let mut cached = self.cached.lock().await;
        let Some(token) = cached.as_mut() else {
            return;
        };
        if token.authorization().is_ok_and(|v| v == *sent) {
            warn!("admin token rejected by server, expiring it");
            token.set_expiry(0);
        }
    }

    async fn password_credentials_token(&self, username: &str, password: &str) -> Result<Token> {
        if username.is_empty() || password.is_empty() || self.config.acc_host().is_empty() {
            return Err(Error::config_invalid(
                "username, password, acc_host cannot be empty",
            ));
        }

        self.grant(
            "PasswordCredentialsToken",
            &[
                ("grant_type", "password"),
                ("username", username),
                ("password", password),
            ],
        )
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Token> {
        self.grant(
            "RefreshToken",
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    async fn grant(&self, api: &str, params: &[(&str, &str)]) -> Result<Token> {
        let host = required_host(Some(self.config.acc_host()), "acc")?;
        let path = format!("/oauth2/token?{}", encode_query(params));

        let mut token = Token::default();
        self.client
            .new_request(operation(Method::POST, host, path, api), Body::Empty)
            .with_data(&mut token)
            .send()
            .await?;

        if token.access_token.is_empty() {
            return Err(Error::deserialization(
                "token response carries no access_token",
            ));
        }
        token.set_expiry(token.expires_in);
        Ok(token)
    }
}

/// Attach the admin token, fetching it when needed.
struct BearerSignHandler(Arc<TokenCache>);

#[async_trait::async_trait]
impl Handler for BearerSignHandler {
    async fn handle(&self, req: &mut Request<'_>) {
        match self.0.token().await.and_then(|t| t.authorization()) {
            Ok(value) => req.set_signature(value),
            Err(err) => req.set_error(err),
        }
    }
}

/// Expire the admin token a `401` response rejected.
struct ExpireTokenHandler(Arc<TokenCache>);

#[async_trait::async_trait]
impl Handler for ExpireTokenHandler {
    async fn handle(&self, req: &mut Request<'_>) {
        let unauthorized = req
            .http_response()
            .is_some_and(|resp| resp.status() == StatusCode::UNAUTHORIZED);
        if !unauthorized {
            return;
        }
        if let Some(sent) = req.http_request().headers().get(AUTHORIZATION).cloned() {
            self.0.expire(&sent).await;
        }
    }
}

/// Retry the first `401` so the sign stage attaches a fresh token.
fn retry_unauthorized_handler() -> NamedHandler {
    NamedHandler::from_fn(RETRY_UNAUTHORIZED_HANDLER, |req| {
        let unauthorized = req.error().and_then(|e| e.status()) == Some(StatusCode::UNAUTHORIZED);
        if unauthorized && req.retry_count() == 0 {
            req.set_retryable(true);
        }
    })
}

fn operation(
    method: Method,
    host: String,
    path: impl Into<String>,
    name: &str,
) -> Operation {
    Operation::new(method, host, path).with_name(SERVICE_NAME, name)
}

fn required_host(host: Option<&str>, name: &str) -> Result<String> {
    match host.map(str::trim) {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(Error::config_invalid(format!("{name} host cannot be empty"))),
    }
}

fn encode_query(params: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

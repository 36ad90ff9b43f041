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

use crate::corehandlers::{default_handlers, default_user_agent};
use crate::credential::Credentials;
use crate::handlers::{Handlers, NamedHandler};
use crate::request::{Body, Operation};
use crate::retry::{DefaultRetryer, Retryer};
use crate::{Config, Context, Request};
use http::header::USER_AGENT;
use http::HeaderValue;
use std::sync::Arc;

/// Client holds everything requests to one service share.
///
/// Every request gets its own copy of the client's handlers, so adding a
/// handler to a request never affects the client.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    config: Arc<Config>,
    handlers: Handlers,
    credentials: Option<Arc<Credentials>>,
    retryer: Arc<dyn Retryer>,
}

impl Client {
    /// Create a client with the default handlers.
    ///
    /// Credentials are resolved through [`Config::credential_chain`].
    pub fn new(ctx: Context, config: Config) -> Self {
        let retryer = DefaultRetryer::new().with_max_retries(config.max_retries());
        let credentials = Credentials::new(ctx.clone(), config.credential_chain());

        let mut handlers = default_handlers();
        if let Some(ua) = config.user_agent.clone() {
            handlers.build.push_back(NamedHandler::from_fn(
                "core.CustomUserAgentHandler",
                move |req| {
                    let value = format!("{} {ua}", default_user_agent());
                    if let Ok(v) = HeaderValue::from_str(&value) {
                        req.http_request_mut().headers_mut().insert(USER_AGENT, v);
                    }
                },
            ));
        }

        Self {
            ctx,
            config: Arc::new(config),
            handlers,
            credentials: Some(Arc::new(credentials)),
            retryer: Arc::new(retryer),
        }
    }

    /// Replace the handlers.
    pub fn with_handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Replace the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(Arc::new(credentials));
        self
    }

    /// Replace the retryer.
    pub fn with_retryer(mut self, retryer: impl Retryer) -> Self {
        self.retryer = Arc::new(retryer);
        self
    }

    /// Context of this client.
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Config of this client.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handlers of this client.
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Mutable handlers of this client.
    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// Credentials of this client.
    pub fn credentials(&self) -> Option<&Arc<Credentials>> {
        self.credentials.as_ref()
    }

    /// Create an unsigned request.
    pub fn new_request<'a>(&self, operation: Operation, body: Body) -> Request<'a> {
        Request::new(self.ctx.clone(), self.handlers.clone(), operation)
            .with_body(body)
            .with_retryer(self.retryer.clone())
    }

    /// Create a request signed with the client's credentials.
    pub fn new_signed_request<'a>(&self, operation: Operation, body: Body) -> Request<'a> {
        let req = self.new_request(operation, body);
        match &self.credentials {
            Some(credentials) => req.with_credentials(credentials.clone()),
            None => req,
        }
    }
}

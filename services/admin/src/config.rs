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
use qiniu_core::utils::Redact;
use qiniu_core::Context;
use std::fmt::{self, Debug};

/// Config carries the hosts and admin account used by [`crate::Service`].
#[derive(Clone, Default)]
pub struct Config {
    /// `acc_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_ACC_HOST`]
    /// - default to [`DEFAULT_ACC_HOST`]
    pub acc_host: Option<String>,
    /// `trade_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_TRADE_HOST`]
    pub trade_host: Option<String>,
    /// `gaea_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_GAEA_HOST`]
    pub gaea_host: Option<String>,
    /// `api_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_API_HOST`]
    /// - default to [`DEFAULT_API_HOST`]
    pub api_host: Option<String>,
    /// `sso_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_SSO_HOST`]
    pub sso_host: Option<String>,
    /// `morse_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_MORSE_HOST`]
    pub morse_host: Option<String>,
    /// `uc_host` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_UC_HOST`]
    /// - default to [`DEFAULT_UC_HOST`]
    pub uc_host: Option<String>,
    /// `username` of the admin account will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_ADMIN_USERNAME`]
    pub username: Option<String>,
    /// `password` of the admin account will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_ADMIN_PASSWORD`]
    pub password: Option<String>,
    /// `email_client_id` sent as `Client-Id` to the notification service
    /// will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_EMAIL_CLIENT_ID`]
    pub email_client_id: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("acc_host", &self.acc_host)
            .field("trade_host", &self.trade_host)
            .field("gaea_host", &self.gaea_host)
            .field("api_host", &self.api_host)
            .field("sso_host", &self.sso_host)
            .field("morse_host", &self.morse_host)
            .field("uc_host", &self.uc_host)
            .field("username", &self.username)
            .field("password", &Redact::from(&self.password))
            .field("email_client_id", &self.email_client_id)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let fields = [
            (&mut self.acc_host, QINIU_ACC_HOST),
            (&mut self.trade_host, QINIU_TRADE_HOST),
            (&mut self.gaea_host, QINIU_GAEA_HOST),
            (&mut self.api_host, QINIU_API_HOST),
            (&mut self.sso_host, QINIU_SSO_HOST),
            (&mut self.morse_host, QINIU_MORSE_HOST),
            (&mut self.uc_host, QINIU_UC_HOST),
            (&mut self.username, QINIU_ADMIN_USERNAME),
            (&mut self.password, QINIU_ADMIN_PASSWORD),
            (&mut self.email_client_id, QINIU_EMAIL_CLIENT_ID),
        ];
        for (field, key) in fields {
            if let Some(v) = ctx.env_var(key) {
                field.get_or_insert(v);
            }
        }

        self
    }

    /// Set the admin account.
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Account host in effect.
    pub fn acc_host(&self) -> &str {
        self.acc_host.as_deref().unwrap_or(DEFAULT_ACC_HOST)
    }

    /// API host in effect.
    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    /// Bucket host in effect.
    pub fn uc_host(&self) -> &str {
        self.uc_host.as_deref().unwrap_or(DEFAULT_UC_HOST)
    }
}

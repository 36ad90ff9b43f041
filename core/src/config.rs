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
use crate::credential::{
    EnvCredentialProvider, ProvideCredentialChain, StaticCredentialProvider,
};
use crate::utils::Redact;
use crate::Context;
use std::fmt::{self, Debug};

/// Config carries the settings shared by every qiniu client.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_ACCESS_KEY`]
    pub access_key: Option<String>,
    /// `secret_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_SECRET_KEY`]
    pub secret_key: Option<String>,
    /// `max_retries` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`QINIU_MAX_RETRIES`]
    /// - default to [`DEFAULT_MAX_RETRIES`]
    pub max_retries: Option<u32>,
    /// Report every provider failure when the credential chain is exhausted.
    ///
    /// Enabled by env value [`QINIU_CREDENTIALS_CHAIN_VERBOSE_ERRORS`] set to
    /// `true` or `1`.
    pub credentials_chain_verbose_errors: bool,
    /// User agent overriding the default one.
    pub user_agent: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_key", &Redact::from(&self.access_key))
            .field("secret_key", &Redact::from(&self.secret_key))
            .field("max_retries", &self.max_retries)
            .field(
                "credentials_chain_verbose_errors",
                &self.credentials_chain_verbose_errors,
            )
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(QINIU_ACCESS_KEY) {
            self.access_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(QINIU_SECRET_KEY) {
            self.secret_key.get_or_insert(v);
        }
        if let Some(v) = ctx
            .env_var(QINIU_MAX_RETRIES)
            .and_then(|v| v.trim().parse().ok())
        {
            self.max_retries.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(QINIU_CREDENTIALS_CHAIN_VERBOSE_ERRORS) {
            self.credentials_chain_verbose_errors |=
                v.eq_ignore_ascii_case("true") || v == "1";
        }

        self
    }

    /// Set the access key and secret key.
    pub fn with_keys(mut self, access_key: &str, secret_key: &str) -> Self {
        self.access_key = Some(access_key.to_string());
        self.secret_key = Some(secret_key.to_string());
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Maximum number of retries in effect.
    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    /// Credential chain used when no credentials are given explicitly.
    ///
    /// Keys set on the config come first, the environment second.
    pub fn credential_chain(&self) -> ProvideCredentialChain {
        let mut chain = ProvideCredentialChain::new()
            .with_verbose_errors(self.credentials_chain_verbose_errors);

        if let (Some(ak), Some(sk)) = (&self.access_key, &self.secret_key) {
            chain = chain.push(StaticCredentialProvider::new(ak, sk));
        }
        chain.push(EnvCredentialProvider::new())
    }
}

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

//! Credential values, providers and the caching wrapper around them.

use crate::utils::Redact;
use crate::{Context, Result};
use std::fmt::{self, Debug};

mod chain;
pub use chain::ProvideCredentialChain;

mod credentials;
pub use credentials::Credentials;

mod env;
pub use env::EnvCredentialProvider;
pub use env::ENV_PROVIDER_NAME;

mod static_provider;
pub use static_provider::StaticCredentialProvider;
pub use static_provider::STATIC_PROVIDER_NAME;

/// Credential is an access key and secret key pair resolved by a provider.
///
/// A credential with a blank access key or secret key can still be returned by
/// a provider, but [`Credential::is_valid`] reports it as unusable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    /// Access key used to identify the caller.
    pub access_key: String,
    /// Secret key used to sign requests.
    pub secret_key: String,
    /// Optional session token.
    pub session_token: Option<String>,
    /// Name of the provider that produced this credential.
    pub provider_name: String,
}

impl Credential {
    /// Create a credential from an access key and secret key.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            ..Default::default()
        }
    }

    /// Set the session token.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Set the provider name.
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Check if both keys are present.
    pub fn is_valid(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &Redact::from(&self.access_key))
            .field("secret_key", &Redact::from(&self.secret_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

/// ProvideCredential resolves a [`Credential`] from some source.
///
/// Providers do no caching of their own; wrap them in [`Credentials`] to reuse
/// a resolved value.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + 'static {
    /// Resolve the credential.
    async fn provide_credential(&self, ctx: &Context) -> Result<Credential>;

    /// Report whether the last resolved credential should be considered stale.
    fn is_expired(&self) -> bool {
        false
    }
}

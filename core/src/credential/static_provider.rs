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

use super::{Credential, ProvideCredential};
use crate::{Context, Error, Result};

/// Name reported by [`StaticCredentialProvider`].
pub const STATIC_PROVIDER_NAME: &str = "StaticProvider";

/// StaticCredentialProvider returns a credential set programmatically.
///
/// It never expires.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create a new StaticCredentialProvider with access key and secret key.
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self::from_credential(Credential::new(access_key, secret_key))
    }

    /// Create a new StaticCredentialProvider from an existing credential.
    pub fn from_credential(credential: Credential) -> Self {
        Self { credential }
    }

    /// Set the session token.
    pub fn with_session_token(mut self, token: &str) -> Self {
        self.credential.session_token = Some(token.to_string());
        self
    }
}

#[async_trait::async_trait]
impl ProvideCredential for StaticCredentialProvider {
    async fn provide_credential(&self, _: &Context) -> Result<Credential> {
        if !self.credential.is_valid() {
            return Err(Error::empty_credentials("static credentials are empty")
                .with_provider(STATIC_PROVIDER_NAME));
        }

        let mut cred = self.credential.clone();
        if cred.provider_name.is_empty() {
            cred.provider_name = STATIC_PROVIDER_NAME.to_string();
        }
        Ok(cred)
    }
}

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
use crate::constants::*;
use crate::{Context, Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Name reported by [`EnvCredentialProvider`].
pub const ENV_PROVIDER_NAME: &str = "EnvProvider";

/// EnvCredentialProvider loads credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `QINIU_ACCESS_KEY`: The access key
/// - `QINIU_SECRET_KEY`: The secret key
/// - `QINIU_SESSION_TOKEN`: The session token (optional)
///
/// The environment is read on every call. The provider reports itself expired
/// until the first successful read.
#[derive(Debug, Default)]
pub struct EnvCredentialProvider {
    retrieved: AtomicBool,
}

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProvideCredential for EnvCredentialProvider {
    async fn provide_credential(&self, ctx: &Context) -> Result<Credential> {
        self.retrieved.store(false, Ordering::Release);

        let access_key = ctx.env_var(QINIU_ACCESS_KEY).filter(|v| !v.is_empty());
        let secret_key = ctx.env_var(QINIU_SECRET_KEY).filter(|v| !v.is_empty());

        let (Some(access_key), Some(secret_key)) = (access_key, secret_key) else {
            return Err(Error::credential_not_found(format!(
                "{QINIU_ACCESS_KEY} or {QINIU_SECRET_KEY} not found in environment"
            ))
            .with_provider(ENV_PROVIDER_NAME));
        };

        self.retrieved.store(true, Ordering::Release);
        Ok(Credential {
            access_key,
            secret_key,
            session_token: ctx.env_var(QINIU_SESSION_TOKEN),
            provider_name: ENV_PROVIDER_NAME.to_string(),
        })
    }

    fn is_expired(&self) -> bool {
        !self.retrieved.load(Ordering::Acquire)
    }
}

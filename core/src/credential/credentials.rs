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

use super::{Credential, ProvideCredential, StaticCredentialProvider};
use crate::{Context, Result};
use log::debug;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Credentials caches the credential resolved by a provider.
///
/// Concurrent callers of [`Credentials::get`] share the cached value while it
/// is fresh. Re-resolution happens under the write lock and is re-checked
/// after acquiring it, so the provider runs at most once per expiry.
pub struct Credentials {
    ctx: Context,
    provider: Box<dyn ProvideCredential>,
    cached: RwLock<Option<Credential>>,
    force_refresh: AtomicBool,
}

impl Credentials {
    /// Wrap a provider.
    pub fn new(ctx: Context, provider: impl ProvideCredential) -> Self {
        Self {
            ctx,
            provider: Box::new(provider),
            cached: RwLock::new(None),
            force_refresh: AtomicBool::new(true),
        }
    }

    /// Wrap a [`StaticCredentialProvider`] built from the given keys.
    pub fn new_static(ctx: Context, access_key: &str, secret_key: &str) -> Self {
        Self::new(ctx, StaticCredentialProvider::new(access_key, secret_key))
    }

    /// Return the cached credential, resolving it again when expired.
    ///
    /// A failed resolution leaves the cache untouched.
    pub async fn get(&self) -> Result<Credential> {
        {
            let cached = self.cached.read().await;
            if let Some(cred) = cached.as_ref().filter(|_| !self.is_expired()) {
                return Ok(cred.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(cred) = cached.as_ref().filter(|_| !self.is_expired()) {
            return Ok(cred.clone());
        }

        // Cleared before resolving, an `expire` racing the provider must survive.
        self.force_refresh.store(false, Ordering::Release);
        debug!("resolving credential from provider: {:?}", self.provider);
        match self.provider.provide_credential(&self.ctx).await {
            Ok(cred) => {
                *cached = Some(cred.clone());
                Ok(cred)
            }
            Err(err) => {
                self.force_refresh.store(true, Ordering::Release);
                Err(err)
            }
        }
    }

    /// Force the next [`Credentials::get`] to resolve the credential again.
    pub fn expire(&self) {
        self.force_refresh.store(true, Ordering::Release);
    }

    /// Check if the cached credential must be resolved again.
    pub fn is_expired(&self) -> bool {
        self.force_refresh.load(Ordering::Acquire) || self.provider.is_expired()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("provider", &self.provider)
            .field("force_refresh", &self.force_refresh)
            .finish()
    }
}

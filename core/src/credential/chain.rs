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
use log::{debug, warn};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};

const NO_PROVIDER: usize = usize::MAX;

/// A chain of credential providers that will be tried in order.
///
/// The first provider returning a valid credential wins and is remembered, so
/// [`ProvideCredential::is_expired`] reflects the provider actually in use.
pub struct ProvideCredentialChain {
    providers: Vec<Box<dyn ProvideCredential>>,
    verbose_errors: bool,
    current: AtomicUsize,
}

impl ProvideCredentialChain {
    /// Create a new empty credential provider chain.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            verbose_errors: false,
            current: AtomicUsize::new(NO_PROVIDER),
        }
    }

    /// Add a credential provider to the chain.
    pub fn push(mut self, provider: impl ProvideCredential) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Create a credential provider chain from a vector of providers.
    pub fn from_vec(providers: Vec<Box<dyn ProvideCredential>>) -> Self {
        Self {
            providers,
            ..Self::new()
        }
    }

    /// Include every provider's failure in the error returned when the chain
    /// is exhausted.
    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = verbose;
        self
    }

    /// Index of the provider that produced the last credential.
    pub fn current_index(&self) -> Option<usize> {
        match self.current.load(Ordering::Acquire) {
            NO_PROVIDER => None,
            idx => Some(idx),
        }
    }
}

impl Default for ProvideCredentialChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ProvideCredentialChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvideCredentialChain")
            .field("providers_count", &self.providers.len())
            .field("verbose_errors", &self.verbose_errors)
            .finish()
    }
}

#[async_trait::async_trait]
impl ProvideCredential for ProvideCredentialChain {
    async fn provide_credential(&self, ctx: &Context) -> Result<Credential> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for (idx, provider) in self.providers.iter().enumerate() {
            debug!("trying credential provider: {provider:?}");

            match provider.provide_credential(ctx).await {
                Ok(cred) if cred.is_valid() => {
                    debug!("loaded credential from provider: {provider:?}");
                    self.current.store(idx, Ordering::Release);
                    return Ok(cred);
                }
                Ok(_) => {
                    debug!("provider {provider:?} returned empty credentials");
                    failures.push(format!("{provider:?} returned empty credentials"));
                }
                Err(e) => {
                    warn!("error loading credential from provider {provider:?}: {e}");
                    failures.push(e.to_string());
                }
            }
        }

        self.current.store(NO_PROVIDER, Ordering::Release);

        let err = if self.verbose_errors && !failures.is_empty() {
            Error::provider_chain_exhausted(format!(
                "no valid providers in chain: {}",
                failures.join("; ")
            ))
        } else {
            Error::provider_chain_exhausted("no valid providers in chain")
        };
        Err(err)
    }

    fn is_expired(&self) -> bool {
        match self.current_index() {
            Some(idx) => self.providers[idx].is_expired(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticCredentialProvider;
    use crate::ErrorKind;

    #[derive(Debug)]
    struct MockFailProvider(&'static str);

    #[async_trait::async_trait]
    impl ProvideCredential for MockFailProvider {
        async fn provide_credential(&self, _ctx: &Context) -> Result<Credential> {
            Err(Error::credential_not_found(self.0))
        }
    }

    #[derive(Debug)]
    struct MockEmptyProvider;

    #[async_trait::async_trait]
    impl ProvideCredential for MockEmptyProvider {
        async fn provide_credential(&self, _ctx: &Context) -> Result<Credential> {
            Ok(Credential::default())
        }
    }

    #[tokio::test]
    async fn test_chain_returns_first_success() {
        let ctx = Context::new();

        let chain = ProvideCredentialChain::new()
            .push(MockFailProvider("first failed"))
            .push(MockEmptyProvider)
            .push(StaticCredentialProvider::new("test_key", "test_secret"))
            .push(StaticCredentialProvider::new("unused", "unused"));
        assert!(chain.is_expired());

        let cred = chain.provide_credential(&ctx).await.unwrap();
        assert_eq!(cred.access_key, "test_key");
        assert_eq!(cred.secret_key, "test_secret");
        assert_eq!(chain.current_index(), Some(2));
        assert!(!chain.is_expired());
    }

    #[tokio::test]
    async fn test_chain_verbose_errors() {
        let chain = ProvideCredentialChain::new()
            .push(MockFailProvider("provider a failed"))
            .push(MockFailProvider("provider b failed"))
            .with_verbose_errors(true);

        let err = chain.provide_credential(&Context::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderChainExhausted);
        assert!(err.to_string().contains("provider a failed"));
        assert!(err.to_string().contains("provider b failed"));
        assert_eq!(chain.current_index(), None);
    }

    #[tokio::test]
    async fn test_chain_terse_errors() {
        let chain = ProvideCredentialChain::new()
            .push(MockFailProvider("provider a failed"))
            .push(MockFailProvider("provider b failed"));

        let err = chain.provide_credential(&Context::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProviderChainExhausted);
        assert_eq!(err.to_string(), "no valid providers in chain");
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let chain = ProvideCredentialChain::default().with_verbose_errors(true);
        let err = chain.provide_credential(&Context::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "no valid providers in chain");
    }
}

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

use http::header::AUTHORIZATION;
use http::HeaderValue;
use qiniu_core::time::{now, DateTime};
use qiniu_core::utils::Redact;
use qiniu_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Token is an OAuth2 access token issued by the account service.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token used to authorize requests.
    pub access_token: String,
    /// Type of the token, `Bearer` when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// Lifetime in seconds, as returned by the token endpoint.
    #[serde(default)]
    pub expires_in: i64,
    /// Instant the token expires, `None` means it never expires.
    ///
    /// Computed once at issuance with [`Token::set_expiry`].
    #[serde(skip)]
    pub expiry: Option<DateTime>,
}

impl Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &Redact::from(&self.access_token))
            .field("token_type", &self.token_type)
            .field("refresh_token", &Redact::from(&self.refresh_token))
            .field("expires_in", &self.expires_in)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Token {
    /// Set the expiry to `expires_in` seconds from now.
    pub fn set_expiry(&mut self, expires_in: i64) {
        self.set_expiry_from(now(), expires_in);
    }

    /// Set the expiry to `expires_in` seconds after `issued_at`.
    pub fn set_expiry_from(&mut self, issued_at: DateTime, expires_in: i64) {
        let expiry = chrono::TimeDelta::try_seconds(expires_in)
            .and_then(|d| issued_at.checked_add_signed(d))
            .unwrap_or(if expires_in < 0 {
                DateTime::MIN_UTC
            } else {
                DateTime::MAX_UTC
            });
        self.expiry = Some(expiry);
    }

    /// Normalized token type used in the `Authorization` header.
    pub fn kind(&self) -> &str {
        if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else if self.token_type.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if self.token_type.eq_ignore_ascii_case("basic") {
            "Basic"
        } else if !self.token_type.is_empty() {
            &self.token_type
        } else {
            "Bearer"
        }
    }

    /// Value of the `Authorization` header: `<kind> <access_token>`.
    pub fn authorization(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("{} {}", self.kind(), self.access_token))
            .map_err(|e| Error::request_invalid("invalid access token").with_source(e))?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Set `Authorization: <kind> <access_token>` on the request.
    pub fn set_auth_header<B>(&self, req: &mut http::Request<B>) -> Result<()> {
        req.headers_mut().insert(AUTHORIZATION, self.authorization()?);
        Ok(())
    }

    /// Check if the token is expired at the given instant.
    pub fn expired_at(&self, at: DateTime) -> bool {
        self.expiry.is_some_and(|expiry| at >= expiry)
    }

    /// Check if the token is expired now.
    pub fn expired(&self) -> bool {
        self.expired_at(now())
    }

    /// Check if the token can authorize requests at the given instant.
    pub fn valid_at(&self, at: DateTime) -> bool {
        !self.access_token.is_empty() && !self.expired_at(at)
    }

    /// Check if the token can authorize requests now.
    pub fn is_valid(&self) -> bool {
        self.valid_at(now())
    }
}

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

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The error type for qiniu operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    provider: Option<String>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Credentials were resolved but the access key or secret key is blank
    EmptyCredentials,

    /// Credentials are not present in the source a provider reads from
    CredentialNotFound,

    /// Every provider in a credential chain failed
    ProviderChainExhausted,

    /// Request cannot be built or signed
    RequestInvalid,

    /// Transport failure while sending the request
    Network,

    /// The service answered with a non-2xx status
    HttpStatus,

    /// Response body could not be decoded for a recognized content type
    Deserialization,

    /// The request was cancelled or its deadline was exceeded
    Cancelled,

    /// Unexpected errors
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            provider: None,
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach the name of the credential provider that produced this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code carried by [`ErrorKind::HttpStatus`] errors.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Name of the credential provider that produced this error, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Check if this is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::EmptyCredentials
                | ErrorKind::CredentialNotFound
                | ErrorKind::ProviderChainExhausted
        )
    }

    /// Check if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    /// Check if retrying the request could succeed.
    ///
    /// Network failures and 5xx responses are retryable. Cancellation never is.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network => true,
            ErrorKind::HttpStatus => self.status.is_some_and(|s| s.is_server_error()),
            _ => false,
        }
    }
}

// Convenience constructors
impl Error {
    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an empty credentials error
    pub fn empty_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyCredentials, message)
    }

    /// Create a credential not found error
    pub fn credential_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialNotFound, message)
    }

    /// Create a provider chain exhausted error
    pub fn provider_chain_exhausted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProviderChainExhausted, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Create an error for a non-2xx response
    pub fn http_status(status: StatusCode, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::HttpStatus, message);
        err.status = Some(status);
        err
    }

    /// Create a deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialization, message)
    }

    /// Create a cancelled error
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::EmptyCredentials => write!(f, "empty credentials"),
            ErrorKind::CredentialNotFound => write!(f, "credentials not found"),
            ErrorKind::ProviderChainExhausted => write!(f, "no valid credential providers"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::HttpStatus => write!(f, "unexpected http status"),
            ErrorKind::Deserialization => write!(f, "deserialization error"),
            ErrorKind::Cancelled => write!(f, "request cancelled"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

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

//! Core components for calling qiniu APIs.
//!
//! Every API call is a [`Request`] that flows through ordered lists of named
//! handlers: build, sign, send, validate response, unmarshal, after retry and
//! complete. Handlers record errors on the request, the executor in
//! [`Request::send`] decides whether an attempt is retried.
//!
//! ## Overview
//!
//! - **Context**: the transport ([`HttpSend`]) and environment ([`Env`]) injected by the host
//! - **Credentials**: providers, chains of providers and a cache around them
//! - **Handlers**: [`NamedHandler`], [`HandlerList`] and the per-stage [`Handlers`]
//! - **Client**: shared config, handlers, credentials and retryer for one service
//!
//! ## Example
//!
//! ```no_run
//! use qiniu_core::{Body, Client, Config, Context, Operation, Result};
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let client = Client::new(ctx, Config::default().with_keys("ak", "sk"));
//!
//! let mut buckets: Vec<String> = Vec::new();
//! client
//!     .new_signed_request(Operation::get("uc.qbox.me", "/buckets"), Body::Empty)
//!     .with_data(&mut buckets)
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod constants;
pub mod corehandlers;
pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};
mod error;
pub use error::{Error, ErrorKind, Result};

pub mod credential;
pub use credential::{
    Credential, Credentials, EnvCredentialProvider, ProvideCredential, ProvideCredentialChain,
    StaticCredentialProvider,
};

mod handlers;
pub use handlers::{never_stop, stop_on_error, Handler, HandlerList, Handlers, NamedHandler};
mod request;
pub use request::{clone_http_request, Body, CancelSignal, DecodeTarget, Operation, Request};
mod retry;
pub use retry::{DefaultRetryer, NoOpRetryer, Retryer};

mod client;
pub use client::Client;
mod config;
pub use config::Config;

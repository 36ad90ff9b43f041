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

//! Qiniu SDK for Rust.
//!
//! This crate glues the request pipeline in [`qiniu_core`] together with a
//! transport and the service APIs built on top of it.
//!
//! ## Features
//!
//! - `default-context`: [`default_context`] backed by reqwest and the OS environment
//! - `admin`: the [`admin`] APIs
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> qiniu_sdk::Result<()> {
//! let service = qiniu_sdk::admin::default_service();
//! let token = service.token().await?;
//! println!("token expires in {}s", token.expires_in);
//! # Ok(())
//! # }
//! ```

pub use qiniu_core::*;

#[cfg(feature = "default-context")]
pub use qiniu_http_send_reqwest::ReqwestHttpSend;

/// Context sending requests with reqwest and reading the OS environment.
#[cfg(feature = "default-context")]
pub fn default_context() -> Context {
    Context::new()
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}

#[cfg(feature = "admin")]
pub mod admin {
    //! Admin APIs, see [`qiniu_admin`].

    pub use qiniu_admin::*;

    /// Admin service configured from the environment of [`crate::default_context`].
    #[cfg(feature = "default-context")]
    pub fn default_service() -> Service {
        Service::from_env(crate::default_context())
    }
}

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

//! Qiniu admin APIs.
//!
//! [`Service`] wraps a [`qiniu_core::Client`] with the account, trade, Gaea,
//! SSO and notification endpoints used by administration tools. Calls made
//! on behalf of the admin account share one cached OAuth2 [`Token`].
//!
//! ```no_run
//! use qiniu_admin::{Config, Service};
//! use qiniu_core::{Context, Result};
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let core = qiniu_core::Config::default().from_env(&ctx);
//! let config = Config::default()
//!     .from_env(&ctx)
//!     .with_account("admin@qiniu.com", "password");
//! let service = Service::new(qiniu_core::Client::new(ctx, core), config);
//!
//! let developer = service.get_developer(1380000000).await?;
//! println!("{}", developer.email);
//! # Ok(())
//! # }
//! ```

pub mod constants;

mod config;
pub use config::Config;

mod email;
pub use email::{send_email, Email, Emailer};

pub mod models;

mod service;
pub use service::Service;

mod sso;
pub use sso::decode_sso_token;

mod token;
pub use token::Token;

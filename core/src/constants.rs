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

//! Env keys and protocol values shared across qiniu crates.

// Env values used by qiniu services.
/// Env key of the access key.
pub const QINIU_ACCESS_KEY: &str = "QINIU_ACCESS_KEY";
/// Env key of the secret key.
pub const QINIU_SECRET_KEY: &str = "QINIU_SECRET_KEY";
/// Env key of the optional session token.
pub const QINIU_SESSION_TOKEN: &str = "QINIU_SESSION_TOKEN";
/// Env key of the maximum number of retries.
pub const QINIU_MAX_RETRIES: &str = "QINIU_MAX_RETRIES";
/// Env key enabling verbose credential chain errors.
pub const QINIU_CREDENTIALS_CHAIN_VERBOSE_ERRORS: &str = "QINIU_CREDENTIALS_CHAIN_VERBOSE_ERRORS";

// Content types recognized by the pipeline.
/// JSON content type.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Form content type.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Retries performed when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Scheme of the `Authorization` header written by the QBox signer.
pub const QBOX_AUTHORIZATION_PREFIX: &str = "QBox";

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

// Env values used by the admin service.
pub const QINIU_ACC_HOST: &str = "QINIU_ACC_HOST";
pub const QINIU_TRADE_HOST: &str = "QINIU_TRADE_HOST";
pub const QINIU_GAEA_HOST: &str = "QINIU_GAEA_HOST";
pub const QINIU_API_HOST: &str = "QINIU_API_HOST";
pub const QINIU_SSO_HOST: &str = "QINIU_SSO_HOST";
pub const QINIU_MORSE_HOST: &str = "QINIU_MORSE_HOST";
pub const QINIU_UC_HOST: &str = "QINIU_UC_HOST";
pub const QINIU_ADMIN_USERNAME: &str = "QINIU_ADMIN_USERNAME";
pub const QINIU_ADMIN_PASSWORD: &str = "QINIU_ADMIN_PASSWORD";
pub const QINIU_EMAIL_CLIENT_ID: &str = "QINIU_EMAIL_CLIENT_ID";

// Hosts used when nothing is configured.
pub const DEFAULT_ACC_HOST: &str = "https://acc.qbox.me";
pub const DEFAULT_API_HOST: &str = "https://api.qiniu.com";
pub const DEFAULT_UC_HOST: &str = "https://uc.qbox.me";

pub const SERVICE_NAME: &str = "Service";
pub const CLIENT_ID_HEADER: &str = "client-id";

// Handlers installed on admin requests.
pub const BEARER_SIGN_HANDLER: &str = "admin.BearerSignHandler";
pub const EXPIRE_TOKEN_HANDLER: &str = "admin.ExpireTokenHandler";
pub const RETRY_UNAUTHORIZED_HANDLER: &str = "admin.RetryUnauthorizedHandler";

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

use percent_encoding::percent_decode_str;
use qiniu_core::hash::{base64_url_decode, hex_hmac_sha512};
use qiniu_core::{Error, Result};

/// Verify an SSO token and return the raw value it carries.
///
/// The token is the url-safe base64 encoding of `<raw>:<hash>`, where `raw`
/// is query-escaped and `hash` is the hex HMAC-SHA512 of the unescaped raw
/// value keyed by the client secret.
pub fn decode_sso_token(client_secret: &str, token: &str) -> Result<String> {
    let decoded = base64_url_decode(token)?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid_sso_token())?;

    let parts: Vec<&str> = decoded.split(':').collect();
    let [raw, hash] = parts.as_slice() else {
        return Err(invalid_sso_token());
    };
    let (raw, hash) = (raw.trim(), hash.trim());
    if raw.is_empty() || hash.is_empty() {
        return Err(invalid_sso_token());
    }

    let raw = query_unescape(raw)?;
    if hex_hmac_sha512(client_secret.as_bytes(), raw.as_bytes()) != hash {
        return Err(invalid_sso_token());
    }
    Ok(raw)
}

fn invalid_sso_token() -> Error {
    Error::request_invalid("invalid sso token")
}

/// Decode a query component: `+` is a space and every `%` starts a hex pair.
fn query_unescape(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    for (idx, _) in s.match_indices('%') {
        let valid = bytes
            .get(idx + 1..idx + 3)
            .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(Error::request_invalid(format!(
                "invalid escape in sso token: {}",
                &s[idx..]
            )));
        }
    }

    let replaced = s.replace('+', " ");
    percent_decode_str(&replaced)
        .decode_utf8()
        .map(|v| v.into_owned())
        .map_err(|e| Error::request_invalid("sso token is not valid utf-8").with_source(e))
}

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

//! Hash related utils.

use crate::Error;
use base64::prelude::BASE64_URL_SAFE;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use sha1::Sha1;
use sha2::Sha512;

/// URL-safe base64 encode, padded.
pub fn base64_url_encode(content: &[u8]) -> String {
    BASE64_URL_SAFE.encode(content)
}

/// URL-safe base64 decode, padded.
pub fn base64_url_decode(content: &str) -> crate::Result<Vec<u8>> {
    BASE64_URL_SAFE
        .decode(content)
        .map_err(|e| Error::request_invalid("base64 decode failed").with_source(e))
}

/// HMAC with SHA1 hash.
pub fn hmac_sha1(key: &[u8], content: &[u8]) -> Vec<u8> {
    let mut h = Hmac::<Sha1>::new_from_slice(key).expect("invalid key length");
    h.update(content);

    h.finalize().into_bytes().to_vec()
}

/// URL-safe base64 encoded HMAC with SHA1 hash.
///
/// This is the digest QBox access tokens are built from.
pub fn base64_url_hmac_sha1(key: &[u8], content: &[u8]) -> String {
    base64_url_encode(&hmac_sha1(key, content))
}

/// Hex encoded HMAC with SHA512 hash.
pub fn hex_hmac_sha512(key: &[u8], content: &[u8]) -> String {
    let mut h = Hmac::<Sha512>::new_from_slice(key).expect("invalid key length");
    h.update(content);

    hex::encode(h.finalize().into_bytes())
}

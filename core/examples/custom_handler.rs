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

//! Replace the QBox signer with a custom handler and watch the request go
//! through a local transport.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::AUTHORIZATION;
use http::HeaderValue;
use qiniu_core::corehandlers::QBOX_SIGN_HANDLER;
use qiniu_core::{Body, Client, Config, Context, HttpSend, NamedHandler, Operation, Result};

/// Transport answering every request with the headers it received.
#[derive(Debug)]
struct EchoHttpSend;

#[async_trait]
impl HttpSend for EchoHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let headers: Vec<String> = req
            .headers()
            .iter()
            .map(|(k, v)| format!("{k}: {}", v.to_str().unwrap_or("<binary>")))
            .collect();
        let body = serde_json::to_vec(&headers)?;

        let mut resp = http::Response::new(Bytes::from(body));
        resp.headers_mut()
            .insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(resp)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let ctx = Context::new().with_http_send(EchoHttpSend);
    let mut client = Client::new(ctx, Config::default().with_keys("ak", "sk"));

    let replaced = client.handlers_mut().sign.swap(
        QBOX_SIGN_HANDLER,
        NamedHandler::from_fn("example.TokenSignHandler", |req| {
            req.http_request_mut()
                .headers_mut()
                .insert(AUTHORIZATION, HeaderValue::from_static("Token demo"));
        }),
    );
    println!("qbox signer replaced: {replaced}");

    let mut headers: Vec<String> = Vec::new();
    client
        .new_signed_request(Operation::get("uc.qbox.me", "/buckets"), Body::Empty)
        .with_data(&mut headers)
        .send()
        .await?;

    for header in headers {
        println!("{header}");
    }
    Ok(())
}

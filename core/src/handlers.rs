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

//! Named handlers and the ordered lists the request pipeline is made of.

use crate::Request;
use std::borrow::Cow;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Handler is one unit of request-processing logic.
///
/// Handlers never return errors: they record them on the [`Request`] with
/// [`Request::set_error`] and return.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Process the request.
    async fn handle(&self, req: &mut Request<'_>);
}

struct FnHandler<F>(F);

#[async_trait::async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Request<'_>) + Send + Sync + 'static,
{
    async fn handle(&self, req: &mut Request<'_>) {
        (self.0)(req)
    }
}

/// NamedHandler pairs a handler with the name used to find it in a list.
#[derive(Clone)]
pub struct NamedHandler {
    name: Cow<'static, str>,
    handler: Arc<dyn Handler>,
}

impl NamedHandler {
    /// Create a named handler.
    pub fn new(name: impl Into<Cow<'static, str>>, handler: impl Handler) -> Self {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    /// Create a named handler from a synchronous closure.
    pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&mut Request<'_>) + Send + Sync + 'static,
    {
        Self::new(name, FnHandler(f))
    }

    /// Name of this handler.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the handler.
    pub async fn handle(&self, req: &mut Request<'_>) {
        self.handler.handle(req).await
    }
}

impl Debug for NamedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedHandler").field(&self.name).finish()
    }
}

/// StopPredicate decides, after each handler, whether the rest of a list is skipped.
pub type StopPredicate = Arc<dyn Fn(&Request<'_>) -> bool + Send + Sync>;

/// Stop as soon as the request carries an error.
pub fn stop_on_error(req: &Request<'_>) -> bool {
    req.error().is_some()
}

/// Never stop, used by lists that must run every handler.
pub fn never_stop(_: &Request<'_>) -> bool {
    false
}

/// HandlerList is an ordered list of named handlers.
///
/// Cloning a list gives an independent ordering that still shares the
/// underlying handlers, so a base list can be copied and extended per client.
#[derive(Clone)]
pub struct HandlerList {
    list: Vec<NamedHandler>,
    stop_when: StopPredicate,
}

impl Default for HandlerList {
    fn default() -> Self {
        Self {
            list: Vec::new(),
            stop_when: Arc::new(stop_on_error),
        }
    }
}

impl Debug for HandlerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl HandlerList {
    /// Create an empty list that stops on the first error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stop predicate.
    pub fn with_stop_predicate(
        mut self,
        f: impl Fn(&Request<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.stop_when = Arc::new(f);
        self
    }

    /// Append a handler.
    pub fn push_back(&mut self, handler: NamedHandler) {
        self.list.push(handler);
    }

    /// Prepend a handler.
    pub fn push_front(&mut self, handler: NamedHandler) {
        self.list.insert(0, handler);
    }

    /// Remove every handler with the given name.
    pub fn remove(&mut self, name: &str) {
        self.list.retain(|h| h.name() != name);
    }

    /// Replace every handler with the given name, returns whether any was replaced.
    pub fn swap(&mut self, name: &str, handler: NamedHandler) -> bool {
        let mut swapped = false;
        for h in self.list.iter_mut().filter(|h| h.name() == name) {
            *h = handler.clone();
            swapped = true;
        }
        swapped
    }

    /// Remove all handlers.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the list has no handlers.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Names of the handlers in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.list.iter().map(NamedHandler::name).collect()
    }

    /// Run handlers in order until the stop predicate fires.
    pub async fn run(&self, req: &mut Request<'_>) {
        for handler in &self.list {
            handler.handle(req).await;
            if (self.stop_when)(req) {
                return;
            }
        }
    }
}

/// Handlers holds one list per pipeline stage.
#[derive(Clone, Debug)]
pub struct Handlers {
    /// Compose URL, headers and body.
    pub build: HandlerList,
    /// Attach authentication.
    pub sign: HandlerList,
    /// Perform the network call.
    pub send: HandlerList,
    /// Inspect the response status.
    pub validate_response: HandlerList,
    /// Decode a successful response.
    pub unmarshal: HandlerList,
    /// Run after a failed send or validation, before the retry decision.
    ///
    /// Every handler runs, the request always carries an error here.
    pub after_retry: HandlerList,
    /// Always run once the request finished.
    pub complete: HandlerList,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            build: HandlerList::new(),
            sign: HandlerList::new(),
            send: HandlerList::new(),
            validate_response: HandlerList::new(),
            unmarshal: HandlerList::new(),
            after_retry: HandlerList::new().with_stop_predicate(never_stop),
            complete: HandlerList::new().with_stop_predicate(never_stop),
        }
    }
}

impl Handlers {
    /// Remove every handler from every list.
    pub fn clear(&mut self) {
        self.build.clear();
        self.sign.clear();
        self.send.clear();
        self.validate_response.clear();
        self.unmarshal.clear();
        self.after_retry.clear();
        self.complete.clear();
    }
}

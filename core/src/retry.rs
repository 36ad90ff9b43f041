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

use crate::constants::DEFAULT_MAX_RETRIES;
use crate::Request;
use std::fmt::Debug;
use std::time::Duration;

/// Retryer decides how often and how long to wait before a failed request
/// is sent again.
pub trait Retryer: Debug + Send + Sync + 'static {
    /// Maximum number of retries after the first attempt.
    fn max_retries(&self) -> u32;

    /// Check if the error recorded on the request is worth retrying.
    ///
    /// Consulted by the default after-retry handler when no other handler
    /// set a retryable hint.
    fn should_retry(&self, req: &Request<'_>) -> bool {
        req.error().is_some_and(|e| e.is_retryable())
    }

    /// Delay before the next attempt.
    fn retry_delay(&self, req: &Request<'_>) -> Duration;
}

/// DefaultRetryer retries with a capped exponential delay.
#[derive(Debug, Clone)]
pub struct DefaultRetryer {
    max_retries: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for DefaultRetryer {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: Duration::from_millis(30),
            max_delay: Duration::from_millis(300),
        }
    }
}

impl DefaultRetryer {
    /// Create a retryer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the upper bound of the delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

impl Retryer for DefaultRetryer {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn retry_delay(&self, req: &Request<'_>) -> Duration {
        let shift = req.retry_count().min(16);
        self.min_delay
            .saturating_mul(1 << shift)
            .min(self.max_delay)
    }
}

/// NoOpRetryer never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpRetryer;

impl Retryer for NoOpRetryer {
    fn max_retries(&self) -> u32 {
        0
    }

    fn should_retry(&self, _: &Request<'_>) -> bool {
        false
    }

    fn retry_delay(&self, _: &Request<'_>) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Handlers, Operation};
    use test_case::test_case;

    #[test_case(0, 30; "first retry")]
    #[test_case(1, 60; "second retry")]
    #[test_case(2, 120; "third retry")]
    #[test_case(3, 240; "fourth retry")]
    #[test_case(4, 300; "capped")]
    #[test_case(40, 300; "large count")]
    fn test_default_retry_delay(retry_count: u32, expected_ms: u64) {
        let mut req = Request::new(
            Context::new(),
            Handlers::default(),
            Operation::get("https://example.com", "/"),
        );
        req.set_retry_count(retry_count);

        let delay = DefaultRetryer::new().retry_delay(&req);
        assert_eq!(delay, Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_noop_retryer() {
        let req = Request::new(
            Context::new(),
            Handlers::default(),
            Operation::get("https://example.com", "/"),
        );
        assert_eq!(NoOpRetryer.max_retries(), 0);
        assert!(!NoOpRetryer.should_retry(&req));
    }
}

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

use qiniu_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Email is one message sent through the notification service.
///
/// The notification service validates addresses, only the required fields
/// are checked locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub subject: String,
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(rename = "content")]
    pub message: String,
    pub uid: u32,
}

impl Email {
    /// Trim the subject and check the required fields are set.
    pub fn validate(&mut self) -> Result<()> {
        let trimmed = self.subject.trim();
        if trimmed.len() != self.subject.len() {
            self.subject = trimmed.to_string();
        }

        if self.subject.is_empty() {
            return Err(Error::request_invalid("email subject empty"));
        }
        if self.to.is_empty() {
            return Err(Error::request_invalid("email receiver empty"));
        }
        Ok(())
    }
}

/// Emailer sends emails.
#[async_trait::async_trait]
pub trait Emailer: Send + Sync {
    /// Send one email.
    async fn send_email(&self, email: &Email) -> Result<()>;
}

/// Send an email with the given sender.
pub async fn send_email(sender: &dyn Emailer, email: &Email) -> Result<()> {
    sender.send_email(email).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qiniu_core::ErrorKind;

    fn email() -> Email {
        Email {
            subject: "  bucket quota  ".to_string(),
            to: vec!["ops@qiniu.com".to_string()],
            message: "<p>quota reached</p>".to_string(),
            uid: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_trims_subject() {
        let mut e = email();
        e.validate().unwrap();
        assert_eq!(e.subject, "bucket quota");
    }

    #[test]
    fn test_validate_required_fields() {
        let mut e = Email {
            subject: "   ".to_string(),
            ..email()
        };
        let err = e.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        assert_eq!(err.to_string(), "email subject empty");

        let mut e = Email {
            to: vec![],
            ..email()
        };
        assert_eq!(e.validate().unwrap_err().to_string(), "email receiver empty");
    }

    #[test]
    fn test_email_encode() {
        let value = serde_json::to_value(email()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "subject": "  bucket quota  ",
                "to": ["ops@qiniu.com"],
                "content": "<p>quota reached</p>",
                "uid": 1,
            })
        );
    }
}

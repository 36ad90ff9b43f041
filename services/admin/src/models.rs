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

//! Request and response bodies of the admin APIs.

use qiniu_core::time::DateTime;
use serde::{Deserialize, Serialize};

pub const USER_TYPE_ADMIN: u32 = 0x0001;
pub const USER_TYPE_VIP: u32 = 0x0002;
pub const USER_TYPE_STDUSER: u32 = 0x0004;
pub const USER_TYPE_STDUSER2: u32 = 0x0008;
pub const USER_TYPE_EXPUSER: u32 = 0x0010;
pub const USER_TYPE_PARENTUSER: u32 = 0x0020;
pub const USER_TYPE_OP: u32 = 0x0040;
pub const USER_TYPE_SUPPORT: u32 = 0x0080;
pub const USER_TYPE_CC: u32 = 0x0100;
pub const USER_TYPE_QCOS: u32 = 0x0200;
pub const USER_TYPE_FUSION: u32 = 0x0400;
pub const USER_TYPE_PILI: u32 = 0x0800;
pub const USER_TYPE_PANDORA: u32 = 0x1000;
pub const USER_TYPE_DISTRIBUTION: u32 = 0x2000;
pub const USER_TYPE_QVM: u32 = 0x4000;
pub const USER_TYPE_DISABLED: u32 = 0x8000;

pub const USER_TYPE_USERS: u32 = USER_TYPE_STDUSER | USER_TYPE_STDUSER2 | USER_TYPE_EXPUSER;
pub const USER_TYPE_SUDOERS: u32 = USER_TYPE_ADMIN | USER_TYPE_OP | USER_TYPE_SUPPORT;

/// Bit set describing the kind of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserType(pub u32);

impl UserType {
    /// Check if the account is an administrator.
    pub fn is_admin(self) -> bool {
        self.0 & USER_TYPE_ADMIN != 0
    }

    /// Check if the account is disabled.
    pub fn is_disabled(self) -> bool {
        self.0 & USER_TYPE_DISABLED != 0
    }
}

/// Account information returned for an access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub uid: u32,
    #[serde(rename = "userid")]
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub parent_uid: u32,
    pub is_activated: bool,
    pub user_type: UserType,
    pub device_num: i64,
    pub invitation_num: i64,
    pub last_parent_operation_at: Option<DateTime>,
}

impl UserInfo {
    /// Check if the account is an administrator.
    pub fn is_admin(&self) -> bool {
        self.user_type.is_admin()
    }
}

/// Developer overview returned by the API service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeveloperInfo {
    pub uid: u32,
    pub email: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    pub is_enterprise: bool,
    pub is_certified: bool,
    pub is_internal: bool,
}

/// User behind an SSO login token.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SsoUserInfo {
    pub uid: u32,
    pub email: String,
    pub name: String,
    pub login_token: String,
}

/// One product of a new order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReqProductOrderNew {
    pub product_id: i64,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_duration: Option<u64>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
}

/// New order placed for a buyer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReqOrderNew {
    #[serde(rename = "uid")]
    pub buyer_id: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub memo: String,
    pub orders: Vec<ReqProductOrderNew>,
}

/// Delivery report of a product order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReqProductOrderAccomplish {
    pub id: i64,
    pub property: String,
    pub start_time: DateTime,
    pub force: bool,
}

/// Response of the order creation API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderNewResponse {
    pub code: i64,
    pub message: String,
    pub data: OrderHash,
}

/// Identifier of a created order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderHash {
    #[serde(rename = "order_hash")]
    pub order: String,
}

/// Time unit a product is sold in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductUnit(pub i32);

impl ProductUnit {
    pub const YEARLY: ProductUnit = ProductUnit(1);
    pub const MONTHLY: ProductUnit = ProductUnit(2);
    pub const WEEKLY: ProductUnit = ProductUnit(3);
    pub const DAILY: ProductUnit = ProductUnit(4);
    pub const UNLIMITED: ProductUnit = ProductUnit(99);

    /// Check if the unit is known.
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            Self::YEARLY | Self::MONTHLY | Self::WEEKLY | Self::DAILY | Self::UNLIMITED
        )
    }

    /// Name of the unit.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YEARLY => "year",
            Self::MONTHLY => "month",
            Self::WEEKLY => "week",
            Self::DAILY => "day",
            Self::UNLIMITED => "unlimited",
            _ => "unknown ProductUnit",
        }
    }
}

/// Lifecycle state of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductStatus(pub i32);

impl ProductStatus {
    pub const NEW: ProductStatus = ProductStatus(1);
    pub const ONLINE: ProductStatus = ProductStatus(2);
    pub const DEPRECATED: ProductStatus = ProductStatus(3);
    pub const DELETED: ProductStatus = ProductStatus(4);

    /// Check if the status is known.
    pub fn is_valid(self) -> bool {
        (Self::NEW.0..=Self::DELETED.0).contains(&self.0)
    }

    /// Check if the product can be sold.
    pub fn is_online(self) -> bool {
        self == Self::ONLINE
    }
}

/// Product sold by a seller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub seller_id: i64,
    pub model: String,
    pub spu: String,
    pub unit: ProductUnit,
    pub original_price: f64,
    pub price: f64,
    pub expires_in: u64,
    pub property: String,
    pub description: String,
    pub update_time: Option<DateTime>,
    pub create_time: Option<DateTime>,
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    pub status: ProductStatus,
    pub settlement_mode: i32,
    pub category_id: i64,
    pub version: i32,
}

/// Envelope every Gaea API wraps its data in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaeaResponse<T> {
    pub code: i64,
    pub message: String,
    pub data: T,
}

/// Developer account as stored by Gaea.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Developer {
    pub uid: u32,
    pub email: String,
    pub full_name: String,
    pub gender: i32,
    pub phone_number: String,
    pub im_number: String,
    pub im_category: i32,
    pub web_site: String,
    pub company_name: String,
    pub contract_address: String,
    pub mobile_binded: bool,
    pub license_version: String,
    pub tags: Vec<String>,
    pub register_ip: String,
    pub register_state: String,
    pub register_region: String,
    pub register_city: String,
    pub location_province: String,
    pub location_city: String,
    pub referrer: String,
    pub inviter_uid: u32,
    pub invite_by_sales: bool,
    pub is_activated: bool,
    pub internal_category: i32,
    pub internal_department: i32,
    pub create_at: i64,
    pub created_at_time: Option<DateTime>,
    pub update_at: Option<DateTime>,
    pub totp_status: i32,
    pub totp_type: i32,
    pub email_history: Vec<String>,
    pub sf_is_enterprise: bool,
    pub sf_sales_id: String,
}

/// Sales user as stored by Gaea.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub cn_name: String,
    pub email: String,
    pub mobile: String,
    #[serde(rename = "QQ")]
    pub qq: String,
    pub git_hub: String,
    pub wiki_dot: String,
    pub slack: String,
    pub extension: String,
    #[serde(rename = "sf_sales_id")]
    pub sf_sales_id: String,
    pub status: u8,
    pub delete: u8,
    pub is_totp_open: bool,
    #[serde(rename = "Create_time")]
    pub create_time: Option<DateTime>,
    #[serde(rename = "Update_time")]
    pub update_time: Option<DateTime>,
}

//! # 身份提供方会话
//!
//! 外部身份提供方的只读视图，以及从中推导后端用户资料的规则。

use serde::{Deserialize, Serialize};

use crate::{ensure_valid, validation_error};
use crate::error::Result;
use crate::types::NewUser;

/// 身份提供方给出的用户描述
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUser {
    /// 提供方用户 ID
    pub id: String,
    /// 名
    #[serde(default)]
    pub first_name: Option<String>,
    /// 姓
    #[serde(default)]
    pub last_name: Option<String>,
    /// 全名
    #[serde(default)]
    pub full_name: Option<String>,
    /// 主邮箱
    #[serde(default)]
    pub primary_email: Option<String>,
}

impl ProviderUser {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.primary_email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    /// 去除首尾空白后的外部身份 ID
    #[must_use]
    pub fn external_id(&self) -> &str {
        self.id.trim()
    }

    fn email(&self) -> Option<&str> {
        self.primary_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    /// 显示名称：全名，其次 “名 姓”，最后取邮箱 @ 之前的部分
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return Some(full.to_string());
            }
        }

        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let joined = joined.trim();
        if !joined.is_empty() {
            return Some(joined.to_string());
        }

        self.email()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(ToString::to_string)
    }

    /// 构造创建后端用户的请求体
    pub fn to_new_user(&self, allowance: f64) -> Result<NewUser> {
        ensure_valid!(!self.external_id().is_empty(), "external_id", "外部身份 ID 不能为空");
        let Some(email) = self.email() else {
            return Err(validation_error!(
                "email",
                "身份提供方未给出主邮箱: {}",
                self.external_id()
            ));
        };
        let name = self.display_name().unwrap_or_else(|| email.to_string());

        Ok(NewUser {
            name,
            email: email.to_string(),
            external_identity_id: self.external_id().to_string(),
            allowance: Some(allowance),
        })
    }
}

/// 身份提供方当前的会话状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSession {
    /// 提供方尚未加载完毕
    Loading,
    /// 未登录
    SignedOut,
    /// 已登录，携带用户描述
    SignedIn(ProviderUser),
}

impl ProviderSession {
    /// 由提供方的加载标志、登录标志和用户描述组合而成
    ///
    /// 已登录但描述尚不可用时按未加载处理。
    #[must_use]
    pub fn from_flags(is_loaded: bool, is_signed_in: bool, user: Option<ProviderUser>) -> Self {
        match (is_loaded, is_signed_in, user) {
            (false, _, _) | (true, true, None) => Self::Loading,
            (true, false, _) => Self::SignedOut,
            (true, true, Some(user)) => Self::SignedIn(user),
        }
    }
}

//! # 测试数据 Fixtures
//!
//! 提供测试用的数据结构和预设数据

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::identity::ProviderUser;
use crate::types::{AnalyticsSnapshot, BackendUser, Expense, ExpenseDraft, UserId};

/// 后端用户测试数据构建器
pub struct BackendUserFixture {
    /// 用户 ID
    pub id: UserId,
    /// 显示名称
    pub name: String,
    /// 邮箱
    pub email: String,
    /// 外部身份 ID
    pub external_identity_id: String,
    /// 每日预算
    pub allowance: f64,
}

impl Default for BackendUserFixture {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            external_identity_id: "ext-test".to_string(),
            allowance: 50.0,
        }
    }
}

impl BackendUserFixture {
    /// 创建新的用户 fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    #[must_use]
    pub fn external_id(mut self, external_id: &str) -> Self {
        self.external_identity_id = external_id.to_string();
        self
    }

    #[must_use]
    pub const fn allowance(mut self, allowance: f64) -> Self {
        self.allowance = allowance;
        self
    }

    #[must_use]
    pub fn build(self) -> BackendUser {
        BackendUser {
            id: self.id,
            name: self.name,
            email: self.email,
            external_identity_id: self.external_identity_id,
            allowance: self.allowance,
        }
    }
}

/// 按 ID 和外部身份生成后端用户
#[must_use]
pub fn backend_user(id: UserId, external_id: &str) -> BackendUser {
    BackendUserFixture::new()
        .id(id)
        .name(&format!("User {id}"))
        .email(&format!("u{id}@example.com"))
        .external_id(external_id)
        .build()
}

/// 带主邮箱的提供方用户
#[must_use]
pub fn provider_user(external_id: &str, email: &str) -> ProviderUser {
    ProviderUser::new(external_id).with_email(email)
}

/// 固定日期，避免测试依赖当前时间
#[must_use]
pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default()
}

#[must_use]
pub fn expense_draft(amount: f64, title: &str) -> ExpenseDraft {
    ExpenseDraft::new(amount, title, sample_date())
}

/// 由请求体生成后端返回的支出记录
#[must_use]
pub fn expense_from_draft(id: i64, user_id: UserId, draft: &ExpenseDraft) -> Expense {
    Expense {
        id,
        amount: draft.amount,
        title: draft.title.clone(),
        notes: draft.notes.clone(),
        category: draft.category.clone(),
        date: draft.date,
        created_at: None,
        user_id,
    }
}

#[must_use]
pub fn analytics_snapshot(user_id: UserId) -> AnalyticsSnapshot {
    let mut by_category = BTreeMap::new();
    by_category.insert("food".to_string(), 42.5);
    by_category.insert("transport".to_string(), 12.0);

    AnalyticsSnapshot {
        user_id,
        name: format!("User {user_id}"),
        allowance: 50.0,
        expected_spend: 150.0,
        actual_spend: 54.5,
        savings: 95.5,
        days_counted: 3,
        overspend_days: 0,
        by_category,
        ai_insight: None,
    }
}

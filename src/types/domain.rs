use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ensure_valid;
use crate::error::Result;

pub type UserId = i64;
pub type ExpenseId = i64;

/// 后端用户记录，按外部身份唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendUser {
    /// 服务端分配的用户 ID
    pub id: UserId,
    /// 显示名称
    pub name: String,
    /// 邮箱
    pub email: String,
    /// 外部身份提供方的用户 ID
    #[serde(rename = "external_id", alias = "clerk_id")]
    pub external_identity_id: String,
    /// 每日预算
    pub allowance: f64,
}

impl BackendUser {
    /// 服务端分配的 ID 为正且预算为有限正数
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.id > 0 && self.allowance.is_finite() && self.allowance > 0.0
    }
}

/// 创建（或服务端同步）后端用户的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// 显示名称
    pub name: String,
    /// 邮箱
    pub email: String,
    /// 外部身份提供方的用户 ID
    #[serde(rename = "external_id")]
    pub external_identity_id: String,
    /// 每日预算，省略时由服务端取默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance: Option<f64>,
}

/// 后端返回的支出记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// 支出 ID
    pub id: ExpenseId,
    /// 金额
    pub amount: f64,
    /// 标题
    pub title: String,
    /// 备注
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 分类
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 发生日期
    pub date: NaiveDate,
    /// 服务端记录时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    /// 所属用户
    pub user_id: UserId,
}

/// 新建支出的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    /// 金额，必须为正数
    pub amount: f64,
    /// 标题，不能为空
    pub title: String,
    /// 备注
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 分类
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 发生日期
    pub date: NaiveDate,
}

impl ExpenseDraft {
    #[must_use]
    pub fn new(amount: f64, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            amount,
            title: title.into(),
            notes: None,
            category: None,
            date,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// 发送前的必填字段检查
    pub fn validate(&self) -> Result<()> {
        ensure_valid!(
            self.amount.is_finite() && self.amount > 0.0,
            "amount",
            "金额必须为正数: {}",
            self.amount
        );
        ensure_valid!(!self.title.trim().is_empty(), "title", "标题不能为空");
        Ok(())
    }
}

/// 分析快照（只读，每次重新请求）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// 用户 ID
    pub user_id: UserId,
    /// 用户名称
    pub name: String,
    /// 每日预算
    pub allowance: f64,
    /// 区间内按预算应花费的金额
    pub expected_spend: f64,
    /// 区间内实际花费
    pub actual_spend: f64,
    /// 预算与实际花费之差
    pub savings: f64,
    /// 统计的天数
    pub days_counted: u32,
    /// 超支天数
    pub overspend_days: u32,
    /// 按分类汇总的花费
    #[serde(default)]
    pub by_category: BTreeMap<String, f64>,
    /// 服务端生成的分析建议
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
}

/// 分析查询的日期区间，两端均可省略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// 起始日期（含）
    pub from: Option<NaiveDate>,
    /// 结束日期（含）
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            ensure_valid!(from <= to, "date_from", "起始日期 {} 晚于结束日期 {}", from, to);
        }
        Ok(())
    }
}

//! # 用户范围句柄
//!
//! 支出与分析请求的唯一入口。每次调用前都重新检查桥接状态，
//! 身份未同步或已切换时直接返回 `NotSynced`，不发起请求。

use super::bridge::IdentityBridge;
use crate::clients::{AnalyticsClient, ExpenseClient};
use crate::error::{ClientError, Result};
use crate::types::{AnalyticsSnapshot, BackendUser, DateRange, Expense, ExpenseDraft, UserId};

/// 绑定到某个已同步后端用户的请求句柄
#[derive(Debug, Clone)]
pub struct UserScope {
    bridge: IdentityBridge,
    user: BackendUser,
    expenses: ExpenseClient,
    analytics: AnalyticsClient,
}

impl UserScope {
    pub(crate) const fn new(
        bridge: IdentityBridge,
        user: BackendUser,
        expenses: ExpenseClient,
        analytics: AnalyticsClient,
    ) -> Self {
        Self {
            bridge,
            user,
            expenses,
            analytics,
        }
    }

    #[must_use]
    pub const fn user(&self) -> &BackendUser {
        &self.user
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }

    fn ensure_current(&self) -> Result<UserId> {
        match self.bridge.current_user() {
            Some(current)
                if current.id == self.user.id
                    && current.external_identity_id == self.user.external_identity_id =>
            {
                Ok(current.id)
            }
            Some(current) => Err(ClientError::not_synced(format!(
                "身份已切换: {} -> {}",
                self.user.external_identity_id, current.external_identity_id
            ))),
            None => Err(ClientError::not_synced(format!(
                "用户 {} 已不再处于同步状态",
                self.user.external_identity_id
            ))),
        }
    }

    pub async fn create_expense(&self, draft: &ExpenseDraft) -> Result<Expense> {
        let user_id = self.ensure_current()?;
        self.expenses.create(user_id, draft).await
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        let user_id = self.ensure_current()?;
        self.expenses.list(user_id).await
    }

    pub async fn analytics(&self, range: DateRange) -> Result<AnalyticsSnapshot> {
        let user_id = self.ensure_current()?;
        self.analytics.get(user_id, range).await
    }
}

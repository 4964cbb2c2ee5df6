//! # 支出资源客户端

use crate::error::Result;
use crate::gateway::RequestGateway;
use crate::types::{Expense, ExpenseDraft, UserId};

/// `/expenses` 接口
#[derive(Debug, Clone)]
pub struct ExpenseClient {
    gateway: RequestGateway,
}

impl ExpenseClient {
    #[must_use]
    pub const fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    fn path(user_id: UserId) -> String {
        format!(
            "/expenses/?user_id={}",
            urlencoding::encode(&user_id.to_string())
        )
    }

    /// `POST /expenses/?user_id=`
    pub async fn create(&self, user_id: UserId, draft: &ExpenseDraft) -> Result<Expense> {
        draft.validate()?;
        self.gateway
            .post(&Self::path(user_id), draft)
            .await?
            .into_body()
    }

    /// `GET /expenses/?user_id=`
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Expense>> {
        Ok(self
            .gateway
            .get::<Vec<Expense>>(&Self::path(user_id))
            .await?
            .into_optional()
            .unwrap_or_default())
    }
}

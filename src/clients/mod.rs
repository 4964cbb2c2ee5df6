//! # 资源客户端
//!
//! 基于 [`RequestGateway`] 的类型化接口，只负责路径和请求体的组装

pub mod analytics;
pub mod expense;
pub mod user;

pub use analytics::AnalyticsClient;
pub use expense::ExpenseClient;
pub use user::UserClient;

use crate::gateway::RequestGateway;

/// 共享同一网关的全部资源客户端
#[derive(Debug, Clone)]
pub struct ResourceClients {
    /// 用户接口
    pub users: UserClient,
    /// 支出接口
    pub expenses: ExpenseClient,
    /// 分析接口
    pub analytics: AnalyticsClient,
}

impl ResourceClients {
    #[must_use]
    pub fn new(gateway: &RequestGateway) -> Self {
        Self {
            users: UserClient::new(gateway.clone()),
            expenses: ExpenseClient::new(gateway.clone()),
            analytics: AnalyticsClient::new(gateway.clone()),
        }
    }
}

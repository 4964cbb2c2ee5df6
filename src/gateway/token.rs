//! # Bearer token 来源
//!
//! 网关在每次请求前向注入的 [`TokenSource`] 询问当前令牌，不读取任何全局状态。

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 提供当前 bearer token 的能力
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// 当前可用的令牌；`None` 表示匿名请求
    async fn bearer_token(&self) -> Option<String>;
}

/// 从不提供令牌
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

#[async_trait]
impl TokenSource for NoToken {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// 固定令牌
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// 由闭包提供令牌
pub struct FnTokenSource<F>(F);

impl<F> FnTokenSource<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> TokenSource for FnTokenSource<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn bearer_token(&self) -> Option<String> {
        (self.0)()
    }
}

/// 可由宿主更新的共享令牌槽
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, token: impl Into<String>) {
        *self.slot.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[async_trait]
impl TokenSource for SharedToken {
    async fn bearer_token(&self) -> Option<String> {
        self.slot.read().await.clone()
    }
}

/// 取出非空令牌
pub(crate) async fn resolve_token(source: &dyn TokenSource) -> Option<String> {
    source
        .bearer_token()
        .await
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

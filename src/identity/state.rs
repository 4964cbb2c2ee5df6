use thiserror::Error;

use crate::error::ClassifiedError;
use crate::types::BackendUser;

/// 身份同步失败，携带分类后的错误
#[derive(Debug, Clone, PartialEq, Error)]
#[error("身份同步失败 ({external_id}): {error}")]
pub struct SyncFailure {
    /// 同步失败的外部身份
    pub external_id: String,
    /// 分类后的错误
    pub error: ClassifiedError,
}

impl SyncFailure {
    #[must_use]
    pub fn new(external_id: impl Into<String>, error: ClassifiedError) -> Self {
        Self {
            external_id: external_id.into(),
            error,
        }
    }
}

/// 身份同步状态，由 `IdentityBridge` 独占写入
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SyncState {
    /// 没有已知的后端用户
    #[default]
    Unresolved,
    /// 正在查找或创建后端用户
    Syncing,
    /// 已同步的后端用户
    Synced(BackendUser),
    /// 最近一次同步失败
    Failed(SyncFailure),
}

impl SyncState {
    #[must_use]
    pub const fn user(&self) -> Option<&BackendUser> {
        match self {
            Self::Synced(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced(_))
    }

    #[must_use]
    pub const fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing)
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&SyncFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// 当前已同步用户是否属于给定外部身份
    #[must_use]
    pub fn is_synced_for(&self, external_id: &str) -> bool {
        self.user()
            .is_some_and(|user| user.external_identity_id == external_id)
    }
}

/// 一次触发的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// 提供方未就绪，或当前状态不需要处理
    Ignored,
    /// 同一身份已同步，未发起请求
    Unchanged(BackendUser),
    /// 同一身份的同步正在进行，本次触发被合并
    Coalesced,
    /// 结果返回前已被更新的触发取代，结果被丢弃
    Superseded,
    /// 同步完成并已写入会话存储
    Synced(BackendUser),
    /// 同步失败
    Failed(SyncFailure),
    /// 已登出
    SignedOut,
}

impl SyncOutcome {
    #[must_use]
    pub const fn user(&self) -> Option<&BackendUser> {
        match self {
            Self::Unchanged(user) | Self::Synced(user) => Some(user),
            _ => None,
        }
    }
}

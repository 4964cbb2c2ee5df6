//! # 会话缓存
//!
//! 持久化最近一次同步成功的后端用户，启动时可同步读取。
//! 缺失或损坏的数据一律视为“未解析”，不会成为致命错误。

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::BackendUser;

/// 持久化的会话记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// 已同步的后端用户
    pub backend_user: BackendUser,
    /// 同步完成时间
    pub resolved_at: DateTime<Utc>,
}

impl SessionRecord {
    #[must_use]
    pub fn new(backend_user: BackendUser) -> Self {
        Self {
            backend_user,
            resolved_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn external_identity_id(&self) -> &str {
        &self.backend_user.external_identity_id
    }
}

/// 会话记录存储，只保存一条记录
pub trait SessionStore: Send + Sync {
    /// 读取记录；缺失或损坏返回 `None`
    fn load(&self) -> Option<SessionRecord>;

    /// 覆盖写入记录
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// 清除记录
    fn clear(&self) -> Result<()>;
}

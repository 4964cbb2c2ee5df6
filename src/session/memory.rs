use std::sync::{PoisonError, RwLock};

use super::{SessionRecord, SessionStore};
use crate::error::Result;

/// 进程内会话存储，供嵌入和测试使用
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: RwLock<Option<SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一条记录
    #[must_use]
    pub fn with_record(record: SessionRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<SessionRecord> {
        self.record
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        *self.record.write().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.record.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

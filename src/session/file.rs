//! # 文件会话存储
//!
//! 记录保存在 `<dir>/<key>.json`，写入时先写临时文件再改名。

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{SessionRecord, SessionStore};
use crate::config::SessionConfig;
use crate::error::{ClientError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};

/// 基于单个 JSON 文件的会话存储
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.store_dir, &config.storage_key)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn discard_corrupt(&self, reason: &str) {
        lwarn!(
            "system",
            LogStage::Session,
            LogComponent::SessionStore,
            "corrupt_record",
            &format!("会话记录损坏，已丢弃: {} ({reason})", self.path.display())
        );
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                lwarn!(
                    "system",
                    LogStage::Session,
                    LogComponent::SessionStore,
                    "remove_corrupt_fail",
                    &format!("删除损坏的会话记录失败: {err}")
                );
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<SessionRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                self.discard_corrupt(&err.to_string());
                return None;
            }
            Err(err) => {
                lwarn!(
                    "system",
                    LogStage::Session,
                    LogComponent::SessionStore,
                    "read_fail",
                    &format!("读取会话记录失败: {} ({err})", self.path.display())
                );
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&content) {
            Ok(record) => {
                ldebug!(
                    "system",
                    LogStage::Session,
                    LogComponent::SessionStore,
                    "loaded",
                    &format!("已读取会话记录: user_id={}", record.backend_user.id)
                );
                Some(record)
            }
            Err(err) => {
                self.discard_corrupt(&err.to_string());
                None
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::store_with_source(format!("无法创建会话目录: {}", parent.display()), e)
            })?;
        }

        let payload = serde_json::to_vec_pretty(record).context("序列化会话记录失败")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload).map_err(|e| {
            ClientError::store_with_source(format!("写入会话记录失败: {}", tmp_path.display()), e)
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ClientError::store_with_source(format!("替换会话记录失败: {}", self.path.display()), e)
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ClientError::store_with_source(
                format!("删除会话记录失败: {}", self.path.display()),
                err,
            )),
        }
    }
}

//! # 客户端配置结构定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::ensure_config;
use crate::error::{ClientError, Result};

/// 客户端主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// 后端API配置
    pub api: ApiConfig,
    /// 会话缓存配置
    pub session: SessionConfig,
    /// 身份同步配置
    pub identity: IdentityConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 后端API配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// 后端基础URL
    pub base_url: String,
    /// 单次请求超时（秒）
    pub timeout_seconds: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_seconds: u64,
    /// User-Agent 请求头
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            user_agent: format!("expense-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// 会话缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 会话文件所在目录
    pub store_dir: PathBuf,
    /// 会话记录使用的键（文件名，不含扩展名）
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data"),
            storage_key: "expense-tracker-session".to_string(),
        }
    }
}

/// 身份同步配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// 首次创建后端用户时使用的每日预算
    pub default_allowance: f64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            default_allowance: 50.0,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// 解析后的后端基础URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.api.base_url).map_err(|e| {
            ClientError::config_with_source(format!("无效的后端地址: {}", self.api.base_url), e)
        })
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        let base_url = self.base_url()?;
        ensure_config!(
            matches!(base_url.scheme(), "http" | "https"),
            "后端地址必须使用 http 或 https: {}",
            self.api.base_url
        );
        ensure_config!(
            !base_url.cannot_be_a_base(),
            "后端地址不能作为基础URL: {}",
            self.api.base_url
        );
        ensure_config!(self.api.timeout_seconds > 0, "请求超时必须大于0");
        ensure_config!(self.api.connect_timeout_seconds > 0, "连接超时必须大于0");
        ensure_config!(
            !self.session.storage_key.trim().is_empty(),
            "会话存储键不能为空"
        );
        ensure_config!(
            !self.session.storage_key.contains(['/', '\\']),
            "会话存储键不能包含路径分隔符: {}",
            self.session.storage_key
        );
        ensure_config!(
            self.identity.default_allowance.is_finite() && self.identity.default_allowance > 0.0,
            "默认每日预算必须为正数: {}",
            self.identity.default_allowance
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ftp://example.com".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http 或 https"));
    }

    #[test]
    fn test_rejects_unparsable_url() {
        let mut config = ClientConfig::default();
        config.api.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ClientError::Config { .. })));
    }

    #[test]
    fn test_rejects_non_positive_allowance() {
        let mut config = ClientConfig::default();
        config.identity.default_allowance = 0.0;
        assert!(config.validate().is_err());
        config.identity.default_allowance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_storage_key() {
        let mut config = ClientConfig::default();
        config.session.storage_key = "  ".into();
        assert!(config.validate().is_err());
        config.session.storage_key = "../escape".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.session.storage_key, "expense-tracker-session");
    }
}

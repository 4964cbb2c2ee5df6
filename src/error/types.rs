//! # 错误类型定义

use thiserror::Error;

use super::network::NetworkError;

/// 客户端主要错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    /// 后端返回了非成功状态码
    #[error("API错误 ({status}): {message}")]
    Api {
        /// HTTP 状态码
        status: u16,
        /// 错误描述
        message: String,
    },

    /// 传输层错误（无HTTP响应）
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// 成功响应但响应体无法解析为预期类型
    #[error("响应解析错误 ({status}): {message}")]
    Parse {
        /// HTTP 状态码
        status: u16,
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 会话存储错误
    #[error("会话存储错误: {message}")]
    Store {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: anyhow::Error,
    },

    /// 请求参数校验错误
    #[error("校验错误: {message}")]
    Validation {
        /// 错误描述
        message: String,
        /// 出错的字段名
        field: Option<String>,
    },

    /// 身份尚未同步，不能发起用户范围内的请求
    #[error("身份未同步: {message}")]
    NotSynced {
        /// 错误描述
        message: String,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带上下文的错误
    #[error("{context}: {source}")]
    Context {
        /// 上下文描述
        context: String,
        /// 底层错误
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// 创建API错误
    pub fn api<T: Into<String>>(status: u16, message: T) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// 创建解析错误
    pub fn parse<T: Into<String>>(status: u16, message: T) -> Self {
        Self::Parse {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的解析错误
    pub fn parse_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        status: u16,
        message: T,
        source: E,
    ) -> Self {
        Self::Parse {
            status,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建存储错误
    pub fn store<T: Into<String>>(message: T) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储错误
    pub fn store_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// 创建针对某个字段的校验错误
    pub fn validation_field<T: Into<String>, F: Into<String>>(field: F, message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// 创建身份未同步错误
    pub fn not_synced<T: Into<String>>(message: T) -> Self {
        Self::NotSynced {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 剥离所有上下文包装，返回最内层错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP状态码（仅API错误和解析错误携带）
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Api { status, .. } | Self::Parse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 是否为传输层错误
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self.root(), Self::Network(_))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::store_with_source("文件操作失败", err)
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::config_with_source("URL解析失败", err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

// Reqwest错误转换
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::internal_with_source("HTTP请求构建失败", err);
        }
        Self::Network(NetworkError::from(err))
    }
}

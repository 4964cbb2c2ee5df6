//! # 错误分类
//!
//! 将任意失败结果映射到封闭的错误种类集合，供调用方按种类分支处理

use serde::{Deserialize, Serialize};
use std::fmt;

use super::network::NetworkError;
use super::types::ClientError;

/// 解析错误统一使用的通用提示
pub const PARSE_ERROR_MESSAGE: &str = "Unexpected response from server";

/// 错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 后端返回了HTTP失败状态
    ApiError,
    /// 没有HTTP响应的传输失败
    NetworkError,
    /// 其他所有错误
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ApiError => "ApiError",
            Self::NetworkError => "NetworkError",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// 分类后的错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// 错误类别
    pub kind: ErrorKind,
    /// HTTP 状态码，仅后端响应错误携带
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// 面向用户的错误描述
    pub message: String,
}

impl ClassifiedError {
    #[must_use]
    pub fn new(kind: ErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::ApiError && self.status == Some(404)
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::ApiError && self.status == Some(409)
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.kind == ErrorKind::ApiError && self.status.is_some_and(|s| (400..500).contains(&s))
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.kind == ErrorKind::ApiError && self.status.is_some_and(|s| s >= 500)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// 对客户端错误进行分类
#[must_use]
pub fn classify(err: &ClientError) -> ClassifiedError {
    match err.root() {
        ClientError::Api { status, message } => {
            ClassifiedError::new(ErrorKind::ApiError, Some(*status), message.clone())
        }
        ClientError::Parse { status, .. } => {
            ClassifiedError::new(ErrorKind::ApiError, Some(*status), PARSE_ERROR_MESSAGE)
        }
        ClientError::Network(network) => classify_network(network),
        other => ClassifiedError::new(ErrorKind::Unknown, None, other.to_string()),
    }
}

/// 对任意错误值进行分类，沿错误链查找可识别的类型
#[must_use]
pub fn classify_dyn(err: &(dyn std::error::Error + 'static)) -> ClassifiedError {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(candidate) = current {
        if let Some(client) = candidate.downcast_ref::<ClientError>() {
            return classify(client);
        }
        if let Some(network) = candidate.downcast_ref::<NetworkError>() {
            return classify_network(network);
        }
        if let Some(reqwest_err) = candidate.downcast_ref::<reqwest::Error>() {
            if let Some(status) = reqwest_err.status() {
                return ClassifiedError::new(
                    ErrorKind::ApiError,
                    Some(status.as_u16()),
                    status.canonical_reason().unwrap_or("HTTP error"),
                );
            }
            return ClassifiedError::new(ErrorKind::NetworkError, None, reqwest_err.to_string());
        }
        current = candidate.source();
    }
    ClassifiedError::new(ErrorKind::Unknown, None, err.to_string())
}

fn classify_network(err: &NetworkError) -> ClassifiedError {
    ClassifiedError::new(ErrorKind::NetworkError, None, format!("Network error: {err}"))
}

impl From<&ClientError> for ClassifiedError {
    fn from(err: &ClientError) -> Self {
        classify(err)
    }
}

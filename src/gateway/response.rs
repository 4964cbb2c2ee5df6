//! # 响应处理
//!
//! 从失败响应中提取可读错误信息，并按内容类型解析成功响应体

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// 错误响应中按顺序检查的字段
pub const ERROR_MESSAGE_FIELDS: [&str; 3] = ["detail", "error", "message"];

/// 网关返回的响应：状态码加可能为空的响应体
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP 状态码
    pub status: StatusCode,
    /// 响应体，204 或空响应为 `None`
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 取出响应体，空响应视为解析错误
    pub fn into_body(self) -> Result<T> {
        self.body
            .ok_or_else(|| ClientError::parse(self.status.as_u16(), "响应体为空"))
    }

    /// 取出可能为空的响应体（适用于变更类接口）
    pub fn into_optional(self) -> Option<T> {
        self.body
    }
}

/// 响应是否声明为 JSON
#[must_use]
pub fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
}

/// 状态行文本
#[must_use]
pub fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string)
}

/// 从失败响应体中提取错误信息
///
/// JSON 响应依次检查 `detail`、`error`、`message`，都没有时返回整个 JSON；
/// 非 JSON 的非空文本原样返回；其余情况回退到状态行文本。
#[must_use]
pub fn extract_error_message(status: StatusCode, is_json: bool, body: &str) -> String {
    if is_json {
        return serde_json::from_str::<Value>(body)
            .ok()
            .map_or_else(|| status_text(status), |value| message_from_json(&value));
    }

    let text = body.trim();
    if text.is_empty() {
        status_text(status)
    } else {
        text.to_string()
    }
}

fn message_from_json(value: &Value) -> String {
    if let Value::Object(map) = value {
        for field in ERROR_MESSAGE_FIELDS {
            match map.get(field) {
                None | Some(Value::Null | Value::Bool(false)) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {}
                Some(Value::String(s)) => return s.clone(),
                Some(other) => return other.to_string(),
            }
        }
    }
    value.to_string()
}

/// 解析成功响应体
///
/// 空响应体返回 `None`；JSON 响应按调用方类型反序列化；
/// 非 JSON 文本作为 JSON 字符串交给调用方类型。
pub fn decode_success_body<T: DeserializeOwned>(
    status: StatusCode,
    is_json: bool,
    bytes: &[u8],
) -> Result<Option<T>> {
    if status == StatusCode::NO_CONTENT || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    if is_json {
        return serde_json::from_slice::<T>(bytes).map(Some).map_err(|e| {
            ClientError::parse_with_source(status.as_u16(), "响应体与预期类型不匹配", e)
        });
    }

    let text = String::from_utf8_lossy(bytes).into_owned();
    serde_json::from_value::<T>(Value::String(text)).map(Some).map_err(|e| {
        ClientError::parse_with_source(status.as_u16(), "非JSON响应无法转换为预期类型", e)
    })
}

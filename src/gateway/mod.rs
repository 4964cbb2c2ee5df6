//! # 请求网关
//!
//! 所有远程调用的唯一入口：构建URL、注入 bearer token、按内容类型解析响应、
//! 把失败归入 `ApiError` / `NetworkError` / `ParseError`。网关本身无状态，可并发复用。

pub mod response;
pub mod token;

pub use response::{ApiResponse, ERROR_MESSAGE_FIELDS, extract_error_message};
pub use token::{FnTokenSource, NoToken, SharedToken, StaticToken, TokenSource};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use url::Url;
use uuid::Uuid;

use crate::config::{ApiConfig, ClientConfig};
use crate::error::{ClientError, NetworkError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, lwarn};

/// 请求网关
#[derive(Clone)]
pub struct RequestGateway {
    http_client: Client,
    base_url: Url,
    token_source: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RequestGateway {
    /// 根据API配置创建网关
    pub fn new(config: &ApiConfig, token_source: Arc<dyn TokenSource>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::config_with_source(format!("无效的后端地址: {}", config.base_url), e)
        })?;

        let http_client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::config_with_source("构建HTTP客户端失败", e))?;

        Ok(Self::with_client(http_client, base_url, token_source))
    }

    /// 根据完整客户端配置创建网关
    pub fn from_config(config: &ClientConfig, token_source: Arc<dyn TokenSource>) -> Result<Self> {
        Self::new(&config.api, token_source)
    }

    /// 使用已有的 reqwest 客户端创建网关
    #[must_use]
    pub fn with_client(http_client: Client, base_url: Url, token_source: Arc<dyn TokenSource>) -> Self {
        Self {
            http_client,
            base_url,
            token_source,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 拼接绝对URL；`path` 必须以 `/` 开头，可携带查询串
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        if !path.starts_with('/') {
            return Err(ClientError::internal(format!("请求路径必须以 / 开头: {path}")));
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| ClientError::internal_with_source(format!("无效的请求路径: {path}"), e))
    }

    /// GET 请求
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.send::<T, ()>(Method::GET, path, None).await
    }

    /// POST JSON 请求
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    /// 发送请求并解析响应
    pub async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4().to_string();
        let url = self.endpoint(path)?;

        let mut request = self.http_client.request(method.clone(), url.clone());
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)?;
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }
        let authenticated = match token::resolve_token(self.token_source.as_ref()).await {
            Some(token) => {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
                true
            }
            None => false,
        };

        ldebug!(
            &request_id,
            LogStage::Request,
            LogComponent::Gateway,
            "send",
            &format!("{method} {url}"),
            authenticated = authenticated
        );

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let err = ClientError::from(err);
                lerror!(
                    &request_id,
                    LogStage::Request,
                    LogComponent::Gateway,
                    "transport_fail",
                    &format!("{method} {url} 请求失败: {err}")
                );
                return Err(err);
            }
        };

        let status = response.status();
        let is_json = response::is_json_content(response.headers());
        let elapsed_ms = started.elapsed().as_millis();

        if !status.is_success() {
            // 读取失败时只保留状态行
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, is_json, &text);
            lwarn!(
                &request_id,
                LogStage::Response,
                LogComponent::Gateway,
                "api_error",
                &format!("{method} {url} -> {status}: {message}"),
                elapsed_ms = elapsed_ms
            );
            return Err(ClientError::api(status.as_u16(), message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(NetworkError::from(e)))?;

        ldebug!(
            &request_id,
            LogStage::Response,
            LogComponent::Gateway,
            "received",
            &format!("{method} {url} -> {status}"),
            elapsed_ms = elapsed_ms,
            body_len = bytes.len()
        );

        let body = response::decode_success_body(status, is_json, &bytes)?;
        Ok(ApiResponse { status, body })
    }
}

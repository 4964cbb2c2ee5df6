//! # 用户资源客户端

use crate::error::{ClientError, Result};
use crate::gateway::RequestGateway;
use crate::logging::{LogComponent, LogStage};
use crate::types::{BackendUser, NewUser};
use crate::ldebug;

/// `/users` 接口
#[derive(Debug, Clone)]
pub struct UserClient {
    gateway: RequestGateway,
}

impl UserClient {
    #[must_use]
    pub const fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// `POST /users/`
    pub async fn create(&self, user: &NewUser) -> Result<BackendUser> {
        self.gateway.post("/users/", user).await?.into_body()
    }

    /// `GET /users/`
    pub async fn list(&self) -> Result<Vec<BackendUser>> {
        Ok(self
            .gateway
            .get::<Vec<BackendUser>>("/users/")
            .await?
            .into_optional()
            .unwrap_or_default())
    }

    /// `GET /users/by-external-id/{id}`，404 视为不存在
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<BackendUser>> {
        let path = format!("/users/by-external-id/{}", urlencoding::encode(external_id));
        match self.gateway.get::<BackendUser>(&path).await {
            Ok(response) => Ok(response.into_optional()),
            Err(ClientError::Api { status: 404, .. }) => {
                ldebug!(
                    "system",
                    LogStage::Response,
                    LogComponent::UserClient,
                    "find_absent",
                    &format!("外部身份尚无后端用户: {external_id}")
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// `POST /users/sync-external-user`，由服务端完成查找或创建
    pub async fn sync_external(&self, user: &NewUser) -> Result<BackendUser> {
        self.gateway
            .post("/users/sync-external-user", user)
            .await?
            .into_body()
    }
}

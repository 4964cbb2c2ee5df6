//! # 客户端装配
//!
//! 把配置、网关、资源客户端、会话存储和身份桥接组装成一个整体，
//! 供界面层持有。

use std::sync::Arc;

use crate::clients::ResourceClients;
use crate::config::{ClientConfig, load_config};
use crate::error::{Context, Result};
use crate::gateway::{RequestGateway, TokenSource};
use crate::identity::{IdentityBridge, UserScope};
use crate::linfo;
use crate::logging::{LogComponent, LogStage, init_logging};
use crate::session::{FileSessionStore, SessionStore};

/// 组装完成的客户端
#[derive(Debug, Clone)]
pub struct ExpenseTracker {
    config: Arc<ClientConfig>,
    gateway: RequestGateway,
    clients: ResourceClients,
    bridge: IdentityBridge,
}

impl ExpenseTracker {
    /// 加载配置、初始化日志并使用文件会话存储
    pub fn from_env(token_source: Arc<dyn TokenSource>) -> Result<Self> {
        let config = load_config().context("加载客户端配置失败")?;
        init_logging(Some(&config.logging.level));
        Self::build(config, token_source)
    }

    /// 根据配置构建，会话记录写入配置指定的目录
    pub fn build(config: ClientConfig, token_source: Arc<dyn TokenSource>) -> Result<Self> {
        let store = Arc::new(FileSessionStore::from_config(&config.session));
        Self::with_store(config, token_source, store)
    }

    /// 使用指定的会话存储构建
    pub fn with_store(
        config: ClientConfig,
        token_source: Arc<dyn TokenSource>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        config.validate()?;
        let gateway = RequestGateway::from_config(&config, token_source)?;
        let clients = ResourceClients::new(&gateway);
        let bridge = IdentityBridge::new(&clients, store, &config.identity);

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Gateway,
            "client_ready",
            &format!("客户端已就绪: base_url={}", gateway.base_url())
        );

        Ok(Self {
            config: Arc::new(config),
            gateway,
            clients,
            bridge,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub const fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    #[must_use]
    pub const fn clients(&self) -> &ResourceClients {
        &self.clients
    }

    #[must_use]
    pub const fn bridge(&self) -> &IdentityBridge {
        &self.bridge
    }

    /// 当前已同步用户的请求句柄
    pub fn scope(&self) -> Result<UserScope> {
        self.bridge.scope()
    }
}

//! # 测试辅助函数
//!
//! 提供通用的测试工具，以及针对后端接口的 wiremock 预设

use serde_json::json;
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracing::Level;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::app::ExpenseTracker;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::gateway::{NoToken, RequestGateway, TokenSource};
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::types::{BackendUser, Expense, UserId};

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 指向给定地址的测试配置
#[must_use]
pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_seconds = 5;
    config.api.connect_timeout_seconds = 2;
    config
}

/// 指向给定地址的网关
pub fn test_gateway(base_url: &str, token_source: Arc<dyn TokenSource>) -> Result<RequestGateway> {
    RequestGateway::from_config(&test_config(base_url), token_source)
}

/// 使用内存会话存储的完整客户端
pub fn test_tracker(base_url: &str) -> Result<(ExpenseTracker, Arc<MemorySessionStore>)> {
    let store = Arc::new(MemorySessionStore::new());
    let tracker = test_tracker_with_store(base_url, store.clone())?;
    Ok((tracker, store))
}

/// 使用指定会话存储的完整客户端
pub fn test_tracker_with_store(
    base_url: &str,
    store: Arc<dyn SessionStore>,
) -> Result<ExpenseTracker> {
    init_test_env();
    ExpenseTracker::with_store(test_config(base_url), Arc::new(NoToken), store)
}

/// 临时目录中的文件会话存储，目录随 `TempDir` 一起删除
pub fn temp_file_store() -> Result<(FileSessionStore, TempDir)> {
    let dir = tempfile::tempdir()?;
    let store = FileSessionStore::new(dir.path(), "expense-tracker-session");
    Ok((store, dir))
}

/// `GET /users/by-external-id/{id}` 返回已有用户
#[must_use]
pub fn find_user_mock(user: &BackendUser) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!(
            "/users/by-external-id/{}",
            user.external_identity_id
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
}

/// `GET /users/by-external-id/{id}` 返回 404
#[must_use]
pub fn find_absent_mock(external_id: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/users/by-external-id/{external_id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "User not found"})))
}

/// `GET /expenses/?user_id=` 返回给定列表
#[must_use]
pub fn list_expenses_mock(user_id: UserId, expenses: &[Expense]) -> Mock {
    Mock::given(method("GET"))
        .and(path("/expenses/"))
        .and(query_param("user_id", user_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(expenses))
}

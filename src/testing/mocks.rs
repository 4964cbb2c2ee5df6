//! # 测试 Mock 对象
//!
//! 提供各种组件的 Mock 实现用于单元测试

use async_trait::async_trait;
use mockall::mock;

use crate::error::Result;
use crate::gateway::TokenSource;
use crate::session::{SessionRecord, SessionStore};

// Mock 会话存储
mock! {
    pub SessionStore {}

    impl SessionStore for SessionStore {
        fn load(&self) -> Option<SessionRecord>;
        fn save(&self, record: &SessionRecord) -> Result<()>;
        fn clear(&self) -> Result<()>;
    }
}

// Mock 令牌来源
mock! {
    pub TokenSource {}

    #[async_trait]
    impl TokenSource for TokenSource {
        async fn bearer_token(&self) -> Option<String>;
    }
}

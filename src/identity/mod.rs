//! # 身份同步
//!
//! 外部身份提供方会话与后端用户记录之间的同步层

pub mod bridge;
pub mod provider;
pub mod scope;
pub mod state;

pub use bridge::IdentityBridge;
pub use provider::{ProviderSession, ProviderUser};
pub use scope::UserScope;
pub use state::{SyncFailure, SyncOutcome, SyncState};

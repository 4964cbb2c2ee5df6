//! # Expense Client Library
//!
//! 每日预算记账应用的身份同步与API网关层

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod logging;
pub mod session;
pub mod testing;
pub mod types;

// Re-export commonly used types
pub use app::ExpenseTracker;
pub use config::ClientConfig;
pub use error::{ClassifiedError, ClientError, ErrorKind, Result, classify};
pub use gateway::{RequestGateway, TokenSource};
pub use identity::{IdentityBridge, ProviderSession, ProviderUser, SyncOutcome, SyncState, UserScope};
pub use session::{FileSessionStore, MemorySessionStore, SessionRecord, SessionStore};

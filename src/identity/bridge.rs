//! # 身份桥接
//!
//! 观察外部身份提供方的会话，查找或创建对应的后端用户，
//! 并把结果依次写入会话存储、发布给订阅者。
//!
//! 状态只在短暂持有的异步互斥锁内变更，网络请求期间不持锁。
//! 每次新的同步会递增代数，返回时代数已过期的结果直接丢弃。

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use super::provider::{ProviderSession, ProviderUser};
use super::scope::UserScope;
use super::state::{SyncFailure, SyncOutcome, SyncState};
use crate::clients::{AnalyticsClient, ExpenseClient, ResourceClients, UserClient};
use crate::config::IdentityConfig;
use crate::error::{ClientError, Result, classify};
use crate::logging::{LogComponent, LogStage};
use crate::session::{SessionRecord, SessionStore};
use crate::types::{BackendUser, NewUser};
use crate::{ldebug, lerror, linfo, lwarn};

#[derive(Debug, Default)]
struct SyncControl {
    generation: u64,
    /// 正在同步的外部身份
    in_flight: Option<String>,
    /// 最近一次观察到的提供方用户，供 `retry` / `refresh` 使用
    last_provider_user: Option<ProviderUser>,
    /// 会话存储中记录所属的外部身份，避免在异步路径上读文件
    stored_identity: Option<String>,
}

struct BridgeInner {
    users: UserClient,
    expenses: ExpenseClient,
    analytics: AnalyticsClient,
    store: Arc<dyn SessionStore>,
    state_tx: watch::Sender<SyncState>,
    control: Mutex<SyncControl>,
    default_allowance: f64,
}

/// 身份同步状态机
#[derive(Clone)]
pub struct IdentityBridge {
    inner: Arc<BridgeInner>,
}

impl std::fmt::Debug for IdentityBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityBridge")
            .field("state", &*self.inner.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl IdentityBridge {
    /// 创建桥接并同步读取会话存储
    #[must_use]
    pub fn new(
        clients: &ResourceClients,
        store: Arc<dyn SessionStore>,
        config: &IdentityConfig,
    ) -> Self {
        let initial = Self::restore(store.as_ref());
        let control = SyncControl {
            stored_identity: initial.user().map(|user| user.external_identity_id.clone()),
            ..SyncControl::default()
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            inner: Arc::new(BridgeInner {
                users: clients.users.clone(),
                expenses: clients.expenses.clone(),
                analytics: clients.analytics.clone(),
                store,
                state_tx,
                control: Mutex::new(control),
                default_allowance: config.default_allowance,
            }),
        }
    }

    /// 有效记录恢复为临时的 `Synced`，否则为 `Unresolved`，不发起请求
    ///
    /// ID 或预算不合法的记录按损坏处理并清除。
    fn restore(store: &dyn SessionStore) -> SyncState {
        match store.load() {
            Some(record) if !record.backend_user.is_resolved() => {
                lwarn!(
                    "system",
                    LogStage::Startup,
                    LogComponent::IdentityBridge,
                    "restore_invalid",
                    &format!(
                        "会话记录中的用户不可用，已丢弃: id={} allowance={}",
                        record.backend_user.id, record.backend_user.allowance
                    )
                );
                if let Err(err) = store.clear() {
                    lerror!(
                        "system",
                        LogStage::Startup,
                        LogComponent::IdentityBridge,
                        "restore_invalid",
                        &format!("清除会话存储失败: {err}")
                    );
                }
                SyncState::Unresolved
            }
            Some(record) => {
                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::IdentityBridge,
                    "restore",
                    &format!(
                        "已从会话存储恢复用户: id={} external_id={}",
                        record.backend_user.id,
                        record.external_identity_id()
                    )
                );
                SyncState::Synced(record.backend_user)
            }
            None => SyncState::Unresolved,
        }
    }

    /// 当前状态快照
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.inner.state_tx.borrow().clone()
    }

    /// 当前已同步的后端用户
    #[must_use]
    pub fn current_user(&self) -> Option<BackendUser> {
        self.inner.state_tx.borrow().user().cloned()
    }

    /// 订阅状态变化
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state_tx.subscribe()
    }

    /// 已同步时返回用户范围句柄
    pub fn scope(&self) -> Result<UserScope> {
        let user = self
            .current_user()
            .ok_or_else(|| ClientError::not_synced("当前没有已同步的后端用户"))?;
        Ok(UserScope::new(
            self.clone(),
            user,
            self.inner.expenses.clone(),
            self.inner.analytics.clone(),
        ))
    }

    /// 处理提供方会话的一次变化
    pub async fn observe(&self, session: ProviderSession) -> SyncOutcome {
        match session {
            ProviderSession::Loading => SyncOutcome::Ignored,
            ProviderSession::SignedOut => self.sign_out().await,
            ProviderSession::SignedIn(user) => self.sync(user, false).await,
        }
    }

    /// 登出：任意状态回到 `Unresolved`，清除记录，不发起请求
    pub async fn sign_out(&self) -> SyncOutcome {
        let mut control = self.inner.control.lock().await;
        control.generation += 1;
        control.in_flight = None;
        control.last_provider_user = None;

        self.clear_store(&mut control, "sign_out");
        self.inner.state_tx.send_replace(SyncState::Unresolved);
        drop(control);

        linfo!(
            "system",
            LogStage::Session,
            LogComponent::IdentityBridge,
            "sign_out",
            "已登出，身份状态重置"
        );
        SyncOutcome::SignedOut
    }

    /// `Failed` 时为最近观察到的身份重新同步
    pub async fn retry(&self) -> SyncOutcome {
        let user = {
            let control = self.inner.control.lock().await;
            if !matches!(*self.inner.state_tx.borrow(), SyncState::Failed(_)) {
                return SyncOutcome::Ignored;
            }
            control.last_provider_user.clone()
        };

        match user {
            Some(user) => self.sync(user, false).await,
            None => SyncOutcome::Ignored,
        }
    }

    /// `Synced` 时强制重新同步当前身份
    pub async fn refresh(&self) -> SyncOutcome {
        let user = {
            let control = self.inner.control.lock().await;
            let Some(current) = self.current_user() else {
                return SyncOutcome::Ignored;
            };
            control
                .last_provider_user
                .clone()
                .filter(|user| user.external_id() == current.external_identity_id)
                .unwrap_or_else(|| {
                    ProviderUser::new(current.external_identity_id.clone())
                        .with_full_name(current.name.clone())
                        .with_email(current.email.clone())
                })
        };
        self.sync(user, true).await
    }

    async fn sync(&self, provider_user: ProviderUser, force: bool) -> SyncOutcome {
        let external_id = provider_user.external_id().to_string();

        let (generation, payload) = {
            let mut control = self.inner.control.lock().await;
            control.last_provider_user = Some(provider_user.clone());

            if control.in_flight.as_deref() == Some(external_id.as_str()) {
                ldebug!(
                    "system",
                    LogStage::Sync,
                    LogComponent::IdentityBridge,
                    "coalesced",
                    &format!("同一身份的同步已在进行: {external_id}")
                );
                return SyncOutcome::Coalesced;
            }

            if !force {
                if let Some(user) = self.inner.state_tx.borrow().user() {
                    if user.external_identity_id == external_id {
                        return SyncOutcome::Unchanged(user.clone());
                    }
                }
            }

            if control
                .stored_identity
                .as_deref()
                .is_some_and(|stored| stored != external_id)
            {
                self.clear_store(&mut control, "identity_swap");
            }

            control.generation += 1;
            let generation = control.generation;

            let payload = match provider_user.to_new_user(self.inner.default_allowance) {
                Ok(payload) => payload,
                Err(err) => {
                    control.in_flight = None;
                    return self.publish_failure(generation, &external_id, &err);
                }
            };

            control.in_flight = Some(external_id.clone());
            self.inner.state_tx.send_replace(SyncState::Syncing);
            (generation, payload)
        };

        linfo!(
            format!("sync-{generation}"),
            LogStage::Sync,
            LogComponent::IdentityBridge,
            "sync_start",
            &format!("开始同步身份: {external_id}"),
            forced = force
        );

        let result = self.resolve(&payload).await;

        let mut control = self.inner.control.lock().await;
        if control.generation != generation {
            ldebug!(
                format!("sync-{generation}"),
                LogStage::Sync,
                LogComponent::IdentityBridge,
                "superseded",
                &format!("同步结果已过期，丢弃: {external_id}"),
                current_generation = control.generation
            );
            return SyncOutcome::Superseded;
        }
        control.in_flight = None;

        match result {
            Ok(user) => {
                // 未写入存储的结果不发布
                if let Err(err) = self.inner.store.save(&SessionRecord::new(user.clone())) {
                    lerror!(
                        format!("sync-{generation}"),
                        LogStage::Session,
                        LogComponent::IdentityBridge,
                        "persist_fail",
                        &format!("写入会话存储失败: {err}")
                    );
                    return self.publish_failure(generation, &external_id, &err);
                }
                control.stored_identity = Some(user.external_identity_id.clone());
                self.inner
                    .state_tx
                    .send_replace(SyncState::Synced(user.clone()));
                drop(control);

                linfo!(
                    format!("sync-{generation}"),
                    LogStage::Sync,
                    LogComponent::IdentityBridge,
                    "sync_done",
                    &format!("身份同步完成: user_id={}", user.id)
                );
                SyncOutcome::Synced(user)
            }
            Err(err) => self.publish_failure(generation, &external_id, &err),
        }
    }

    /// 查找或创建，并拒绝 ID 或预算不合法的用户
    async fn resolve(&self, payload: &NewUser) -> Result<BackendUser> {
        let user = self.find_or_create(payload).await?;
        if !user.is_resolved() {
            return Err(ClientError::parse(
                200,
                format!(
                    "后端返回的用户不可用: id={} allowance={}",
                    user.id, user.allowance
                ),
            ));
        }
        Ok(user)
    }

    /// 查找，不存在时创建；创建遇到 409 时重新查找
    async fn find_or_create(&self, payload: &NewUser) -> Result<BackendUser> {
        let external_id = payload.external_identity_id.as_str();
        if let Some(user) = self.inner.users.find_by_external_id(external_id).await? {
            return Ok(user);
        }

        match self.inner.users.create(payload).await {
            Ok(user) => Ok(user),
            Err(err) if err.status() == Some(409) => {
                lwarn!(
                    "system",
                    LogStage::Sync,
                    LogComponent::IdentityBridge,
                    "create_conflict",
                    &format!("后端用户已存在，重新查找: {external_id}")
                );
                self.inner
                    .users
                    .find_by_external_id(external_id)
                    .await?
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    fn publish_failure(&self, generation: u64, external_id: &str, err: &ClientError) -> SyncOutcome {
        let failure = SyncFailure::new(external_id, classify(err));
        lwarn!(
            format!("sync-{generation}"),
            LogStage::Sync,
            LogComponent::IdentityBridge,
            "sync_fail",
            &failure.to_string()
        );
        self.inner
            .state_tx
            .send_replace(SyncState::Failed(failure.clone()));
        SyncOutcome::Failed(failure)
    }

    fn clear_store(&self, control: &mut SyncControl, operation: &str) {
        control.stored_identity = None;
        if let Err(err) = self.inner.store.clear() {
            lerror!(
                "system",
                LogStage::Session,
                LogComponent::IdentityBridge,
                operation,
                &format!("清除会话存储失败: {err}")
            );
        }
    }
}

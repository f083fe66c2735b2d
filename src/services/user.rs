use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::cache::{CacheLayer, USERS_LIST_KEY};
use crate::database::{StoreError, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, PublicUser, Role, UserPatch, UserRecord, normalize_email};
use crate::utils::{PasswordHasher, TokenIssuer};

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user: PublicUser,
    pub token: String,
    pub expires_at: i64,
}

/// 用户目录服务的运行参数，启动时确定
#[derive(Debug, Clone, Copy)]
pub struct DirectorySettings {
    pub listing_ttl: Duration,
    pub store_timeout: Duration,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            listing_ttl: Duration::from_secs(3600),
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// 用户目录：存储是唯一事实来源，缓存只服务于全量列表读取。
///
/// 所有写操作先落存储，再删除列表缓存键；删除失败只记录，不回滚也不报错，
/// 旧快照最多存活到 `listing_ttl` 过期。
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    cache: CacheLayer,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    settings: DirectorySettings,
}

impl UserDirectory {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: CacheLayer,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        settings: DirectorySettings,
    ) -> Self {
        Self {
            store,
            cache,
            hasher,
            tokens,
            settings,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    async fn store_call<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        super::store_call(self.settings.store_timeout, fut).await
    }

    async fn fetch(&self, id: &str) -> Result<UserRecord, AppError> {
        self.store_call(self.store.find_by_id(id))
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn invalidate_listing(&self) {
        if !self.cache.delete(USERS_LIST_KEY).await {
            tracing::warn!("User listing cache was not invalidated after a successful write");
        }
    }

    pub async fn create(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<PublicUser, AppError> {
        let email = normalize_email(email);

        if self
            .store_call(self.store.find_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AppError::Conflict);
        }

        let password_hash = self.hasher.hash_password(password).await?;
        let new_user = NewUser {
            email,
            username: username.to_string(),
            password_hash,
            role: Role::Member,
            created_at: Utc::now(),
        };

        // 并发注册同一邮箱时，由存储的唯一约束兜底
        let user = match self.store_call(self.store.insert(new_user)).await {
            Ok(user) => user,
            Err(AppError::Store(StoreError::Duplicate)) => return Err(AppError::Conflict),
            Err(e) => return Err(e),
        };
        tracing::info!("Created user {}", user.id);

        self.invalidate_listing().await;
        Ok(user.into())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<PublicUser, AppError> {
        Ok(self.fetch(id).await?.into())
    }

    /// 旁路缓存读取全量列表，缓存内容已去除密码哈希
    pub async fn list(&self) -> Result<Vec<PublicUser>, AppError> {
        if let Some(cached) = self.cache.get(USERS_LIST_KEY).await {
            match serde_json::from_str::<Vec<PublicUser>>(&cached) {
                Ok(users) => {
                    tracing::debug!("User listing served from cache");
                    return Ok(users);
                }
                Err(e) => tracing::warn!("Discarding undecodable user listing: {}", e),
            }
        }

        let users: Vec<PublicUser> = self
            .store_call(self.store.list())
            .await?
            .into_iter()
            .map(PublicUser::from)
            .collect();

        match serde_json::to_string(&users) {
            Ok(json) => {
                self.cache
                    .set(USERS_LIST_KEY, &json, self.settings.listing_ttl)
                    .await
            }
            Err(e) => tracing::warn!("Failed to serialize user listing: {}", e),
        }

        Ok(users)
    }

    /// 只写补丁给出的字段；与并发的改密互不覆盖
    pub async fn update_by_id(&self, id: &str, patch: UserPatch) -> Result<PublicUser, AppError> {
        if let Some(username) = &patch.username {
            if username.trim().is_empty() {
                return Err(AppError::BadRequest("用户名不能为空".into()));
            }
        }

        let patch = UserPatch {
            email: patch.email.as_deref().map(normalize_email),
            ..patch
        };

        let user = match self
            .store_call(self.store.update_profile(id, &patch, Utc::now()))
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AppError::NotFound),
            Err(AppError::Store(StoreError::Duplicate)) => return Err(AppError::Conflict),
            Err(e) => return Err(e),
        };
        tracing::info!("Updated user {}", user.id);

        self.invalidate_listing().await;
        Ok(user.into())
    }

    pub async fn change_password(
        &self,
        id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.fetch(id).await?;

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)
            .await
        {
            return Err(AppError::IncorrectPassword);
        }

        let password_hash = self.hasher.hash_password(new_password).await?;
        let written = self
            .store_call(
                self.store
                    .update_password_hash(&user.id, &password_hash, Utc::now()),
            )
            .await?;
        if !written {
            return Err(AppError::NotFound);
        }
        tracing::info!("Changed password for user {}", user.id);

        self.invalidate_listing().await;
        Ok(())
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let user = self.fetch(id).await?;

        if !self.store_call(self.store.delete(&user.id)).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!("Deleted user {}", user.id);

        self.invalidate_listing().await;
        Ok(())
    }

    /// 账号不存在与密码错误返回同一个 `Unauthorized`，避免暴露邮箱是否注册
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AppError> {
        let email = normalize_email(email);

        let user = match self.store_call(self.store.find_by_email(&email)).await? {
            Some(user) => user,
            None => {
                // 未注册的邮箱也做一次同成本的校验，耗时与密码错误一致
                self.hasher.verify_decoy(password).await;
                return Err(AppError::Unauthorized);
            }
        };

        if !self
            .hasher
            .verify_password(password, &user.password_hash)
            .await
        {
            return Err(AppError::Unauthorized);
        }

        let (token, expires_at) = self.tokens.issue(&user.id, user.role)?;
        tracing::info!("User {} logged in", user.id);

        Ok(AuthenticatedUser {
            user: user.into(),
            token,
            expires_at,
        })
    }
}

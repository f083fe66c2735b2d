use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{NewUser, Role, UserPatch, UserRecord, normalize_email};

/// 内存用户存储，用于测试和未配置数据库的本地运行
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定角色。角色不经接口修改，本地运行和测试时用它设置管理员
    pub async fn set_role(&self, id: &str, role: Role) -> bool {
        match self.users.write().await.get_mut(id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<UserRecord> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &UserPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = patch.email.as_deref().map(normalize_email) {
            if users
                .values()
                .any(|existing| existing.email == email && existing.id != id)
            {
                return Err(StoreError::Duplicate);
            }
        }

        Ok(users.get_mut(id).map(|user| {
            patch.clone().apply(user);
            user.updated_at = updated_at;
            user.clone()
        }))
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.users.write().await.get_mut(id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

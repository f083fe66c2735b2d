use std::sync::Arc;

use bcrypt::{DEFAULT_COST, hash, verify};
use tokio::sync::OnceCell;
use tokio::task::spawn_blocking;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("failed to hash password: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Task(String),
}

/// 账号不存在时用于比对的明文，只为消耗与真实校验相同的时间
const DECOY_PASSWORD: &str = "decoy-password-never-stored";

/// 密码哈希器。成本参数在启动时确定，之后只读。
///
/// bcrypt 是 CPU 密集计算，哈希和校验都放到阻塞线程池执行，不占用异步工作线程。
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    decoy: Arc<OnceCell<String>>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    /// bcrypt 每次调用生成随机盐，同一明文两次哈希结果不同。空密码直接拒绝
    pub async fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }

        let password = password.to_string();
        let cost = self.cost;
        spawn_blocking(move || hash(password.as_bytes(), cost))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
            .map_err(CredentialError::from)
    }

    /// 摘要格式损坏时返回 false 而不是报错
    pub async fn verify_password(&self, password: &str, digest: &str) -> bool {
        let password = password.to_string();
        let digest = digest.to_string();
        match spawn_blocking(move || verify(password.as_bytes(), &digest).unwrap_or(false)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// 对一个同成本的占位摘要做一次完整校验，结果恒为 false。
    /// 邮箱未注册时调用，使登录失败的耗时与密码错误一致
    pub async fn verify_decoy(&self, password: &str) -> bool {
        let decoy = self
            .decoy
            .get_or_try_init(|| self.hash_password(DECOY_PASSWORD))
            .await;

        match decoy {
            Ok(digest) => {
                self.verify_password(password, digest).await;
                false
            }
            Err(e) => {
                tracing::error!("Failed to prepare decoy digest: {}", e);
                false
            }
        }
    }
}

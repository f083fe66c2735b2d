// 业务服务

pub mod board;
pub mod user;

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::database::StoreError;
use crate::error::AppError;

pub use board::PostBoard;
pub use user::{AuthenticatedUser, DirectorySettings, UserDirectory};

/// 存储调用带独立超时，超时即失败
async fn store_call<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout.into()),
    }
}

use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::database::StoreError;
use crate::result::ApiResponse;
use crate::utils::{CredentialError, TokenError};

/// 服务层返回的错误。领域错误是普通返回值，调用方按变体区分，不做字符串匹配
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("user not found")]
    NotFound,
    #[error("post not found")]
    PostNotFound,
    #[error("comment not found")]
    CommentNotFound,
    #[error("email already registered")]
    Conflict,
    /// 认证边界统一使用此变体，不区分账号不存在与密码错误
    #[error("unauthorized")]
    Unauthorized,
    /// 修改密码时当前密码不匹配，记录存在
    #[error("current password is incorrect")]
    IncorrectPassword,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("credential failure: {0}")]
    Credential(CredentialError),
    #[error("token failure: {0}")]
    Token(#[from] TokenError),
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::EmptyPassword => AppError::BadRequest("密码不能为空".into()),
            other => AppError::Credential(other),
        }
    }
}

/// 写入响应扩展的错误类别，请求日志据此区分失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind(pub &'static str);

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::PostNotFound => "post_not_found",
            AppError::CommentNotFound => "comment_not_found",
            AppError::Conflict => "conflict",
            AppError::Unauthorized => "unauthorized",
            AppError::IncorrectPassword => "incorrect_password",
            AppError::Forbidden => "forbidden",
            AppError::BadRequest(_) => "bad_request",
            AppError::Store(StoreError::Unavailable(_)) => "store_unavailable",
            AppError::Store(StoreError::Timeout) => "store_timeout",
            AppError::Store(StoreError::Duplicate) => "store_duplicate",
            AppError::Store(StoreError::Corrupt(_)) => "store_corrupt",
            AppError::Credential(_) => "credential",
            AppError::Token(_) => "token",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::PostNotFound | AppError::CommentNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized | AppError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Credential(_) | AppError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::NotFound => "用户不存在".into(),
            AppError::PostNotFound => "帖子不存在".into(),
            AppError::CommentNotFound => "评论不存在".into(),
            AppError::Conflict => "用户已存在".into(),
            AppError::Unauthorized => "未授权访问".into(),
            AppError::IncorrectPassword => "当前密码不正确".into(),
            AppError::Forbidden => "仅管理员可执行此操作".into(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Store(_) | AppError::Credential(_) | AppError::Token(_) => {
                "内部服务器错误".into()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // 内部细节只进日志，不进响应体
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ApiResponse::<()>::error(status, self.public_message()));
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(ErrorKind(self.kind()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::PostNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CommentNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::IncorrectPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store(StoreError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn empty_password_is_a_bad_request() {
        let err: AppError = CredentialError::EmptyPassword.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn store_failures_keep_their_cause_in_kind() {
        assert_eq!(AppError::Store(StoreError::Timeout).kind(), "store_timeout");
        assert_eq!(
            AppError::Store(StoreError::Unavailable("down".into())).kind(),
            "store_unavailable"
        );
        assert_eq!(AppError::IncorrectPassword.kind(), "incorrect_password");
    }

    #[test]
    fn response_carries_error_kind() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.extensions().get::<ErrorKind>(),
            Some(&ErrorKind("forbidden"))
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Store(StoreError::Unavailable("connection refused to db:5432".into()));
        assert_eq!(err.public_message(), "内部服务器错误");
    }
}

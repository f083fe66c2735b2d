use axum::extract::{Json, Path, State, rejection::JsonRejection};
use axum::http::StatusCode;

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUser,
    models::{PublicUser, UserPatch},
    result::ApiResponse,
    routes::{Reply, body},
    services::AuthenticatedUser,
};

use super::model::{ChangePasswordRequest, CreateUserRequest, DeletedUserResponse, LoginRequest};

#[axum::debug_handler(state = AppState)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Reply<PublicUser> {
    let req = body(payload)?;
    req.validate()?;

    let user = state
        .users
        .create(&req.email, &req.password, &req.username)
        .await?;
    Ok(ApiResponse::created("用户创建成功", user))
}

#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Reply<AuthenticatedUser> {
    let req = body(payload)?;
    req.validate()?;

    let session = state.users.authenticate(&req.email, &req.password).await?;
    Ok(ApiResponse::ok("登录成功", session))
}

#[axum::debug_handler(state = AppState)]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> Reply<Vec<PublicUser>> {
    let users = state.users.list().await?;
    Ok(ApiResponse::ok("获取用户列表成功", users))
}

#[axum::debug_handler(state = AppState)]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Reply<PublicUser> {
    let user = state.users.get_by_id(&id).await?;
    Ok(ApiResponse::ok("获取用户成功", user))
}

#[axum::debug_handler(state = AppState)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Reply<PublicUser> {
    let user = state.users.get_by_id(&claims.sub).await?;
    Ok(ApiResponse::ok("获取用户成功", user))
}

#[axum::debug_handler(state = AppState)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Reply<PublicUser> {
    let patch = body(payload)?;
    update(&state, &claims.sub, patch).await
}

#[axum::debug_handler(state = AppState)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Reply<PublicUser> {
    caller.require_admin()?;
    let patch = body(payload)?;
    update(&state, &id, patch).await
}

async fn update(state: &AppState, id: &str, patch: UserPatch) -> Reply<PublicUser> {
    if patch.is_empty() {
        return Err(AppError::BadRequest("没有可更新的字段".into()));
    }
    if let Some(email) = &patch.email {
        super::model::validate_email(email)?;
    }

    let user = state.users.update_by_id(id, patch).await?;
    Ok(ApiResponse::ok("用户信息更新成功", user))
}

#[axum::debug_handler(state = AppState)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Reply<()> {
    let req = body(payload)?;
    req.validate()?;

    state
        .users
        .change_password(&claims.sub, &req.current_password, &req.new_password)
        .await?;
    Ok(ApiResponse::new(StatusCode::OK, "密码修改成功", None))
}

#[axum::debug_handler(state = AppState)]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Reply<DeletedUserResponse> {
    caller.require_admin()?;

    state.users.delete_by_id(&id).await?;
    Ok(ApiResponse::ok("用户删除成功", DeletedUserResponse { id }))
}

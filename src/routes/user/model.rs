use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.username.trim().is_empty() {
            return Err(AppError::BadRequest("用户名不能为空".into()));
        }
        if self.password.is_empty() {
            return Err(AppError::BadRequest("密码不能为空".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest("邮箱和密码不能为空".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err(AppError::BadRequest("当前密码和新密码不能为空".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub id: String,
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::BadRequest("邮箱格式无效".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email(" A@X.com ").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "ax.com", "@x.com", "a@x"] {
            assert!(
                matches!(validate_email(email), Err(AppError::BadRequest(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn create_requires_all_fields() {
        let req = CreateUserRequest {
            email: "a@x.com".into(),
            password: "".into(),
            username: "alice".into(),
        };
        assert!(req.validate().is_err());
    }
}

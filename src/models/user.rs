use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户角色，新建用户默认为权限最低的 `Member`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// 存储中的完整用户记录，包含密码哈希，只在服务内部流转
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 插入存储前的新用户，id 与时间戳之外的字段由服务填写
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// 对外可见的用户数据，不含任何密码材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            username: record.username,
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// 允许通过通用更新接口修改的字段；角色和密码不在其中
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }

    /// 浅覆盖：提供的字段整体替换，未提供的保持不变
    pub fn apply(self, record: &mut UserRecord) {
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(email) = self.email {
            record.email = normalize_email(&email);
        }
    }
}

/// 邮箱统一去除首尾空白并转为小写，唯一性按此形式判断
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: "u1".into(),
            email: "a@x.com".into(),
            username: "alice".into(),
            password_hash: "$2b$04$hash".into(),
            role: Role::Member,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_overlays_only_supplied_fields() {
        let mut user = record();
        UserPatch {
            username: Some("alicia".into()),
            email: None,
        }
        .apply(&mut user);

        assert_eq!(user.username, "alicia");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, Role::Member);
    }

    #[test]
    fn patch_normalizes_email() {
        let mut user = record();
        UserPatch {
            username: None,
            email: Some("  New@X.com ".into()),
        }
        .apply(&mut user);

        assert_eq!(user.email, "new@x.com");
    }

    #[test]
    fn patch_rejects_role_and_password_fields() {
        let role: Result<UserPatch, _> = serde_json::from_str(r#"{"role":"admin"}"#);
        assert!(role.is_err());

        let password: Result<UserPatch, _> = serde_json::from_str(r#"{"password":"x"}"#);
        assert!(password.is_err());
    }

    #[test]
    fn public_user_has_no_password_material() {
        let json = serde_json::to_string(&PublicUser::from(record())).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains(r#""role":"member""#));
    }
}

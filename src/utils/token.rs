use std::fmt;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::Role;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub role: Role,
    pub iat: i64, // 签发时间
    pub exp: i64, // 过期时间
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 会话令牌签发与校验。密钥启动时加载一次，此后只读，可在线程间共享
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<(String, i64), TokenError> {
        let now = Utc::now().timestamp();
        let expiration = now + self.lifetime.as_secs() as i64;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: expiration,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, expiration))
    }

    /// 过期、格式错误、签名不符都返回 None，属于正常结果
    pub fn validate(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected session token: {:?}", e.kind());
                None
            }
        }
    }
}

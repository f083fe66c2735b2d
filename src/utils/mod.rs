// 凭证与会话令牌

pub mod password;
pub mod token;

pub use password::{CredentialError, PasswordHasher};
pub use token::{Claims, TokenError, TokenIssuer};

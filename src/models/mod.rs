// 领域模型

pub mod comment;
pub mod post;
pub mod user;

pub use comment::{Comment, NewComment};
pub use post::{CATEGORIES, NewPost, Post, PostFilter, PostPatch, is_known_category};
pub use user::{NewUser, PublicUser, Role, UserPatch, UserRecord, normalize_email};

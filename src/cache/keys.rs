/// 全量用户列表缓存键。只有这一份集合被缓存，单个用户不缓存
pub const USERS_LIST_KEY: &str = "users";

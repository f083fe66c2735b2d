#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use backend::{
    AppState,
    cache::{CacheLayer, MemoryCache},
    config::Config,
    database::{MemoryBoardStore, MemoryUserStore},
    services::{DirectorySettings, PostBoard, UserDirectory},
    utils::{PasswordHasher, TokenIssuer},
};

pub const SECRET: &str = "integration-test-secret";

pub fn config() -> Config {
    Config {
        database_url: None,
        redis_url: None,
        jwt_secret: SECRET.into(),
        jwt_expiration_secs: 3600,
        users_cache_ttl_secs: 3600,
        store_timeout_ms: 1000,
        cache_timeout_ms: 100,
        bcrypt_cost: 4,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
    }
}

pub fn directory_with_store(store: Arc<MemoryUserStore>) -> UserDirectory {
    let config = config();
    UserDirectory::new(
        store,
        CacheLayer::new(Arc::new(MemoryCache::new()), config.cache_timeout()),
        PasswordHasher::new(config.bcrypt_cost),
        TokenIssuer::new(&config.jwt_secret, config.jwt_expiration()).unwrap(),
        DirectorySettings {
            listing_ttl: config.users_cache_ttl(),
            store_timeout: config.store_timeout(),
        },
    )
}

pub fn directory() -> UserDirectory {
    directory_with_store(Arc::new(MemoryUserStore::new()))
}

pub fn board() -> PostBoard {
    let store = Arc::new(MemoryBoardStore::new());
    PostBoard::new(store.clone(), store, config().store_timeout())
}

pub fn state_with_store(store: Arc<MemoryUserStore>) -> AppState {
    AppState {
        config: config(),
        users: Arc::new(directory_with_store(store)),
        board: Arc::new(board()),
    }
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::from_secs(3600)).unwrap()
}

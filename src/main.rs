use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use backend::{
    AppState,
    cache::{CacheBackend, CacheLayer, MemoryCache, RedisCache},
    config::Config,
    database::{
        CommentStore, MemoryBoardStore, MemoryUserStore, PgBoardStore, PgUserStore, PostStore,
        UserStore,
    },
    middleware::log_errors,
    routes,
    services::{DirectorySettings, PostBoard, UserDirectory},
    utils::{PasswordHasher, TokenIssuer},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (Arc<dyn UserStore>, Arc<dyn PostStore>, Arc<dyn CommentStore>);

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::debug!("Loaded configuration: {:?}", config);

    // 文档存储：配置了数据库则用 Postgres，否则退回内存存储
    let (store, posts, comments): Stores = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.store_timeout())
                .connect(url)
                .await
                .expect("Failed to connect to Postgres");
            let users = PgUserStore::new(pool.clone());
            users
                .ensure_schema()
                .await
                .expect("Failed to prepare users table");
            let board = PgBoardStore::new(pool);
            board
                .ensure_schema()
                .await
                .expect("Failed to prepare posts and comments tables");
            let users: Arc<dyn UserStore> = Arc::new(users);
            let posts: Arc<dyn PostStore> = Arc::new(board.clone());
            let comments: Arc<dyn CommentStore> = Arc::new(board);
            (users, posts, comments)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores");
            let board = Arc::new(MemoryBoardStore::new());
            let posts: Arc<dyn PostStore> = board.clone();
            let comments: Arc<dyn CommentStore> = board;
            let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
            (users, posts, comments)
        }
    };

    // 缓存：启动时建立长连接，运行中 Redis 不可达时读按未命中处理
    let cache_backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisCache::open(url)
                .await
                .expect("Failed to connect to Redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set, using in-process cache");
            Arc::new(MemoryCache::new())
        }
    };

    let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_expiration())
        .expect("Failed to initialize token issuer");

    let users = UserDirectory::new(
        store,
        CacheLayer::new(cache_backend, config.cache_timeout()),
        PasswordHasher::new(config.bcrypt_cost),
        tokens,
        DirectorySettings {
            listing_ttl: config.users_cache_ttl(),
            store_timeout: config.store_timeout(),
        },
    );

    let board = PostBoard::new(posts, comments, config.store_timeout());

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        users: Arc::new(users),
        board: Arc::new(board),
    };

    let router = routes::router(state.clone()).layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router,
    )
    .await
    .expect("Failed to start server");
}

use config::Config;
use services::{PostBoard, UserDirectory};
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod result;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<UserDirectory>,
    pub board: Arc<PostBoard>,
}

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod retry;
pub mod services;
pub mod telegram;
pub mod week;

pub use app::{build_router, AppState};

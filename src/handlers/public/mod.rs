// handlers/public/mod.rs - Handlers that need no session
//
// Service info, health check and the login / logout pair that hands out and
// clears the `token` cookie.

pub mod auth;
pub mod health;

pub use health::{health, root};

// handlers/protected/mod.rs - Handlers behind the JWT session
//
// Every route here runs after `jwt_auth_middleware`, so handlers take the
// caller from `Extension<AuthUser>`. Role checks beyond "has a session" are
// done per handler.

pub mod auth;
pub mod cities;
pub mod country_aggregates;
pub mod dashboard;
pub mod team_meetings;
pub mod users;
pub mod weekly_reports;

pub mod auth;
pub mod page_guard;
pub mod response;

pub use auth::{cleared_session_cookie, extract_token, jwt_auth_middleware, session_cookie, AuthUser, TOKEN_COOKIE};
pub use page_guard::page_guard;
pub use response::{ApiJson, ApiResponse, ApiResult};

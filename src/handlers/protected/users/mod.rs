// handlers/protected/users/mod.rs - User administration
//
// Listing and reading users is for ADMIN and COUNTRY_MANAGER; changing them is
// ADMIN only. `POST /api/users` also accepts the registration secret in place
// of an admin session, so it is routed outside the JWT layer.

pub mod collection;
pub mod record;

pub use collection::get as users_get;
pub use collection::post as users_post;
pub use record::delete as user_delete;
pub use record::get as user_get;
pub use record::put as user_put;

use crate::auth::{is_known_city, Role};
use crate::error::ApiError;

fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse::<Role>().map_err(|e| ApiError::field("role", e))
}

fn parse_city(city: &str) -> Result<String, ApiError> {
    let city = city.trim().to_uppercase();
    if is_known_city(&city) {
        Ok(city)
    } else {
        Err(ApiError::field("city", format!("Unknown city: {city}")))
    }
}

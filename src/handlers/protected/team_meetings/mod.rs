// handlers/protected/team_meetings/mod.rs - Meeting log (COUNTRY_MANAGER, ADMIN)

pub mod collection;
pub mod record;

pub use collection::get as team_meetings_get;
pub use collection::post as team_meetings_post;
pub use record::delete as team_meeting_delete;
pub use record::put as team_meeting_put;

use crate::auth::Role;

const MEETING_ROLES: &[Role] = &[Role::CountryManager, Role::Admin];

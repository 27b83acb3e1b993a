pub mod city;
pub mod country_aggregate;
pub mod team_meeting;
pub mod user;
pub mod weekly_report;

pub use city::City;
pub use country_aggregate::CountryAggregate;
pub use team_meeting::TeamMeeting;
pub use user::User;
pub use weekly_report::{HrMetrics, OpsMetrics, WeeklyReport};

pub mod aggregate_service;
pub mod dashboard_service;
pub mod job_lock;
pub mod meeting_service;
pub mod report_service;
pub mod user_service;
pub mod weekly_digest;

pub use aggregate_service::AggregateService;
pub use dashboard_service::DashboardService;
pub use job_lock::JobLockService;
pub use meeting_service::MeetingService;
pub use report_service::ReportService;
pub use user_service::UserService;
pub use weekly_digest::DigestService;

// handlers/cron/mod.rs - Scheduled jobs triggered over HTTP
//
// Callers authenticate with `Authorization: Bearer <CRON_SECRET>`; no user
// session is involved.

pub mod weekly_report;

pub use weekly_report::weekly_report_get;

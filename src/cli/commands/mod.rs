pub mod migrate;
pub mod report;
pub mod user;
pub mod week;

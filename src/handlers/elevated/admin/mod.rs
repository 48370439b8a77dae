pub mod access;
pub mod analytics;
pub mod audit_logs;
pub mod maintenance;
pub mod partners;
pub mod settings;

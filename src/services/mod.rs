pub mod analytics;
pub mod audit;
pub mod export;
pub mod ids;
pub mod proxy;

pub use audit::AuditEntry;
pub use ids::generate_id;
pub use proxy::{BackendClient, ProxyError};

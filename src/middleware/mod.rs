pub mod admin;
pub mod auth;
pub mod profile;
pub mod rate_limit;
pub mod response;

pub use admin::{require_admin_middleware, AdminContext};
pub use auth::{jwt_auth_middleware, AuthUser};
pub use profile::{load_profile_middleware, UserContext};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
pub use response::{ApiResponse, ApiResult};

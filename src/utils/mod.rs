// Utility modules for the linkshelf backend

pub mod api_error;
pub mod audit_logger;
pub mod password;
pub mod validation;

pub use api_error::{ApiError, ApiErrorResponse, ApiResult};
pub use audit_logger::{AuditAction, AuditLogger};
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{double_option, normalize_tags, trim_optional_field};

//! Result type alias for composition operations

use crate::error::StrataError;

/// Standard Result type for composition operations
pub type Result<T> = std::result::Result<T, StrataError>;

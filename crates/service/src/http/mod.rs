//! HTTP infrastructure shared by the daemon's servers.

pub mod handlers;
pub mod health;

pub use handlers::not_found_handler;

/// Maximum upload size in bytes (500 MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

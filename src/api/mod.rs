//! REST API layer for the StreamKey Registry

mod error;
mod rest;

pub use error::{ApiError, ErrorCode};
pub use rest::router;

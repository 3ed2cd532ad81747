//! Backend access: request gateway, failure taxonomy, typed endpoints.
//!
//! - `gateway`: bearer-token attachment and response classification
//! - `error`: the four failure kinds every call resolves to
//! - `endpoints`: login, signup, profile, history, scan upload
//! - `models`: serde models for the JSON envelopes

pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod models;

pub use error::{ApiError, ApiErrorKind, ApiResult, SESSION_EXPIRED_MESSAGE};
pub use gateway::{ApiResponse, Auth, Gateway};
pub use models::{Prediction, ScanReceipt, Severity, UNKNOWN, UserProfile};

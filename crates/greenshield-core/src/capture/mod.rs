//! Capture/upload pipeline for the scan screen.

mod controller;
mod state;
mod task;
mod upload;
mod uri;

pub use controller::{CaptureController, UploadOutcome};
pub use state::{
    CaptureError, CapturePhase, CaptureSession, CaptureTicket, UploadFailure, UploadTicket,
};
pub use task::TaskId;
pub use upload::{IMAGE_CONTENT_TYPE, IMAGE_FIELD, IMAGE_FILE_NAME, UploadRequest};
pub use uri::{Platform, has_known_scheme, normalize_image_uri};

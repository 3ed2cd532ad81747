//! Per-screen capture/upload state machine.
//!
//! Pure reducer: every async step is split into a "start" call that hands out
//! a [`TaskId`] and a "finished" call that is ignored unless the id is still
//! the one the session is waiting for.

use std::fmt;

use tracing::{debug, info};

use super::task::{TaskId, TaskSeq, TaskSlot};
use super::upload::UploadRequest;
use super::uri::{Platform, normalize_image_uri};
use crate::api::{ApiError, ScanReceipt, SESSION_EXPIRED_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Captured,
    Uploading,
    Success,
    Error,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Captured => "captured",
            CapturePhase::Uploading => "uploading",
            CapturePhase::Success => "success",
            CapturePhase::Error => "error",
        };
        f.write_str(name)
    }
}

/// Why an upload attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadFailure {
    /// The gateway rejected or could not complete the request.
    Api(ApiError),
    /// The image could not be read locally; nothing was sent.
    Image(String),
}

impl UploadFailure {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, UploadFailure::Api(e) if e.is_session_expired())
    }

    /// Message shown on the error screen.
    pub fn message(&self) -> &str {
        match self {
            UploadFailure::Api(e) if e.is_session_expired() => SESSION_EXPIRED_MESSAGE,
            UploadFailure::Api(e) => &e.message,
            UploadFailure::Image(msg) => msg,
        }
    }
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for UploadFailure {}

impl From<ApiError> for UploadFailure {
    fn from(e: ApiError) -> Self {
        UploadFailure::Api(e)
    }
}

/// An action that is not allowed in the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureError {
    pub action: &'static str,
    pub phase: CapturePhase,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while {}", self.action, self.phase)
    }
}

impl std::error::Error for CaptureError {}

/// Handle for one pending shutter press or gallery pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTicket(TaskId);

/// A started upload: the task id to report back and the request to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub id: TaskId,
    pub request: UploadRequest,
}

#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    phase: CapturePhase,
    image_uri: Option<String>,
    error: Option<UploadFailure>,
    receipt: Option<ScanReceipt>,
    platform: Platform,
    seq: TaskSeq,
    latest_capture: Option<TaskId>,
    upload: TaskSlot,
}

impl CaptureSession {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn image_uri(&self) -> Option<&str> {
        self.image_uri.as_deref()
    }

    pub fn error(&self) -> Option<&UploadFailure> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(UploadFailure::message)
    }

    /// Receipt of the last successful upload, until the next capture.
    pub fn receipt(&self) -> Option<&ScanReceipt> {
        self.receipt.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.phase == CapturePhase::Uploading
    }

    /// Starts a capture or pick; only the newest ticket can resolve.
    pub fn begin_capture(&mut self) -> CaptureTicket {
        let id = self.seq.next_id();
        self.latest_capture = Some(id);
        CaptureTicket(id)
    }

    /// Applies a resolved capture. `None` means the user cancelled.
    ///
    /// Returns false when the result was ignored.
    pub fn capture_resolved(&mut self, ticket: CaptureTicket, uri: Option<String>) -> bool {
        if self.latest_capture != Some(ticket.0) {
            debug!(ticket = ticket.0.0, "stale capture ignored");
            return false;
        }
        self.latest_capture = None;

        let Some(uri) = uri.filter(|u| !u.trim().is_empty()) else {
            debug!("capture cancelled");
            return false;
        };
        if !matches!(self.phase, CapturePhase::Idle | CapturePhase::Captured) {
            debug!(phase = %self.phase, "capture ignored");
            return false;
        }

        self.phase = CapturePhase::Captured;
        self.image_uri = Some(uri);
        self.error = None;
        self.receipt = None;
        true
    }

    /// Discards the current image and any in-flight upload.
    ///
    /// Returns false when already idle.
    pub fn retake(&mut self) -> bool {
        if self.phase == CapturePhase::Idle {
            return false;
        }
        if self.upload.is_running() {
            info!("retake while uploading; result will be discarded");
        }
        self.reset();
        true
    }

    /// Starts the first upload of the captured image.
    ///
    /// # Errors
    /// Unless the phase is `Captured`.
    pub fn use_photo(&mut self, token: Option<String>) -> Result<UploadTicket, CaptureError> {
        self.start_upload("use photo", CapturePhase::Captured, token)
    }

    /// Re-submits the same image after a failure.
    ///
    /// # Errors
    /// Unless the phase is `Error`.
    pub fn retry(&mut self, token: Option<String>) -> Result<UploadTicket, CaptureError> {
        self.start_upload("retry", CapturePhase::Error, token)
    }

    fn start_upload(
        &mut self,
        action: &'static str,
        from: CapturePhase,
        token: Option<String>,
    ) -> Result<UploadTicket, CaptureError> {
        let uri = match (&self.image_uri, self.phase == from) {
            (Some(uri), true) => normalize_image_uri(uri, self.platform),
            _ => {
                return Err(CaptureError {
                    action,
                    phase: self.phase,
                });
            }
        };

        let id = self.seq.next_id();
        self.upload.start(id);
        self.phase = CapturePhase::Uploading;
        self.error = None;
        debug!(task = id.0, %uri, "upload started");

        Ok(UploadTicket {
            id,
            request: UploadRequest::new(uri, token),
        })
    }

    /// Applies an upload completion. Returns false for stale results.
    pub fn upload_finished(
        &mut self,
        id: TaskId,
        result: Result<ScanReceipt, UploadFailure>,
    ) -> bool {
        if !self.upload.finish_if_active(id) {
            debug!(task = id.0, "stale upload result discarded");
            return false;
        }
        match result {
            Ok(receipt) => {
                info!("upload succeeded");
                self.phase = CapturePhase::Success;
                self.receipt = Some(receipt);
            }
            Err(failure) => {
                info!(error = %failure, "upload failed");
                self.phase = CapturePhase::Error;
                self.error = Some(failure);
            }
        }
        true
    }

    /// Leaves `Success` for a fresh `Idle`, keeping the receipt.
    pub fn acknowledge(&mut self) -> bool {
        if self.phase != CapturePhase::Success {
            return false;
        }
        let receipt = self.receipt.take();
        self.reset();
        self.receipt = receipt;
        true
    }

    fn reset(&mut self) {
        self.phase = CapturePhase::Idle;
        self.image_uri = None;
        self.error = None;
        self.receipt = None;
        self.upload.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::ApiErrorKind;

    fn captured(uri: &str) -> CaptureSession {
        let mut session = CaptureSession::new(Platform::Android);
        let ticket = session.begin_capture();
        assert!(session.capture_resolved(ticket, Some(uri.to_string())));
        session
    }

    fn receipt() -> ScanReceipt {
        ScanReceipt {
            message: Some("ok".into()),
            prediction: None,
            data: json!({}),
        }
    }

    fn blurry() -> UploadFailure {
        UploadFailure::Api(ApiError::request_failed(
            422,
            &json!({"success": false, "message": "too blurry"}),
        ))
    }

    /// One session per non-idle phase.
    fn every_non_idle() -> Vec<CaptureSession> {
        let captured_only = captured("/a.jpg");

        let mut uploading = captured("/a.jpg");
        uploading.use_photo(None).unwrap();

        let mut success = captured("/a.jpg");
        let t = success.use_photo(None).unwrap();
        success.upload_finished(t.id, Ok(receipt()));

        let mut error = captured("/a.jpg");
        let t = error.use_photo(None).unwrap();
        error.upload_finished(t.id, Err(blurry()));

        vec![captured_only, uploading, success, error]
    }

    #[test]
    fn test_retake_from_any_non_idle_phase_resets() {
        for mut session in every_non_idle() {
            let from = session.phase();
            assert!(session.retake(), "{from}");
            assert_eq!(session.phase(), CapturePhase::Idle, "{from}");
            assert_eq!(session.image_uri(), None, "{from}");
            assert_eq!(session.error(), None, "{from}");
        }
        assert!(!CaptureSession::default().retake());
    }

    #[test]
    fn test_use_photo_only_from_captured() {
        let mut idle = CaptureSession::default();
        assert_eq!(
            idle.use_photo(None).unwrap_err(),
            CaptureError {
                action: "use photo",
                phase: CapturePhase::Idle
            }
        );

        for mut session in every_non_idle() {
            let from = session.phase();
            assert_eq!(session.use_photo(None).is_ok(), from == CapturePhase::Captured);
        }
    }

    #[test]
    fn test_use_photo_normalizes_uri_and_snapshots_token() {
        let mut session = captured("/cache/leaf.jpg");
        let ticket = session.use_photo(Some("abc".into())).unwrap();

        assert_eq!(ticket.request.uri(), "file:///cache/leaf.jpg");
        assert_eq!(ticket.request.token(), Some("abc"));
        assert!(session.is_uploading());
        assert!(session.use_photo(None).is_err(), "one upload at a time");
    }

    #[test]
    fn test_failure_keeps_image_and_retry_resubmits_it() {
        let mut session = captured("file:///leaf.jpg");
        let first = session.use_photo(None).unwrap();
        assert!(session.upload_finished(first.id, Err(blurry())));

        assert_eq!(session.phase(), CapturePhase::Error);
        assert_eq!(session.error_message(), Some("too blurry"));
        assert_eq!(session.image_uri(), Some("file:///leaf.jpg"));

        let second = session.retry(Some("t".into())).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.request.uri(), "file:///leaf.jpg");
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_retry_only_from_error() {
        for mut session in every_non_idle() {
            let from = session.phase();
            assert_eq!(session.retry(None).is_ok(), from == CapturePhase::Error);
        }
    }

    #[test]
    fn test_session_expired_shows_fixed_message() {
        let mut session = captured("/a.jpg");
        let t = session.use_photo(None).unwrap();
        let mut expired = ApiError::session_expired();
        expired.message = "whatever the server said".into();
        session.upload_finished(t.id, Err(expired.into()));

        assert!(session.error().unwrap().is_session_expired());
        assert_eq!(session.error_message(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn test_success_then_acknowledge_returns_to_idle() {
        let mut session = captured("/a.jpg");
        let t = session.use_photo(None).unwrap();
        assert!(session.upload_finished(t.id, Ok(receipt())));
        assert_eq!(session.phase(), CapturePhase::Success);

        assert!(session.acknowledge());
        assert_eq!(session.phase(), CapturePhase::Idle);
        assert_eq!(session.image_uri(), None);
        assert_eq!(session.receipt().and_then(|r| r.message.as_deref()), Some("ok"));
    }

    #[test]
    fn test_result_after_retake_is_discarded() {
        let mut session = captured("/a.jpg");
        let t = session.use_photo(None).unwrap();
        session.retake();

        assert!(!session.upload_finished(t.id, Err(blurry())));
        assert_eq!(session.phase(), CapturePhase::Idle);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_only_newest_capture_applies() {
        let mut session = CaptureSession::new(Platform::Ios);
        let first = session.begin_capture();
        let second = session.begin_capture();

        assert!(session.capture_resolved(second, Some("/second.jpg".into())));
        assert!(!session.capture_resolved(first, Some("/first.jpg".into())));
        assert_eq!(session.image_uri(), Some("/second.jpg"));
    }

    #[test]
    fn test_cancelled_pick_leaves_state_unchanged() {
        let mut session = captured("/keep.jpg");
        let ticket = session.begin_capture();

        assert!(!session.capture_resolved(ticket, None));
        assert_eq!(session.phase(), CapturePhase::Captured);
        assert_eq!(session.image_uri(), Some("/keep.jpg"));
    }

    #[test]
    fn test_capture_ignored_while_uploading() {
        let mut session = captured("/a.jpg");
        session.use_photo(None).unwrap();
        let ticket = session.begin_capture();

        assert!(!session.capture_resolved(ticket, Some("/b.jpg".into())));
        assert_eq!(session.image_uri(), Some("/a.jpg"));
    }

    #[test]
    fn test_network_failure_message_surfaces() {
        let mut session = captured("/a.jpg");
        let t = session.use_photo(None).unwrap();
        session.upload_finished(t.id, Err(ApiError::network("Could not connect to server").into()));

        let failure = session.error().unwrap();
        assert!(matches!(failure, UploadFailure::Api(e) if e.kind == ApiErrorKind::Network));
        assert_eq!(session.error_message(), Some("Could not connect to server"));
    }
}

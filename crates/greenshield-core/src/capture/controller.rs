//! Screen-level driver that runs uploads against the gateway.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::state::{CaptureError, CapturePhase, CaptureSession, UploadFailure, UploadTicket};
use super::upload::UploadRequest;
use super::uri::Platform;
use crate::api::{Gateway, ScanReceipt};

/// How an upload attempt ended, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Accepted; the session is back in `Idle`.
    Uploaded(ScanReceipt),
    /// Rejected; the session is in `Error` with the image kept.
    Failed(UploadFailure),
    /// Superseded by a retake or by unmounting; state untouched.
    Discarded,
}

/// Owns one screen's [`CaptureSession`] for as long as the screen is mounted.
#[derive(Debug)]
pub struct CaptureController {
    session: Arc<Mutex<CaptureSession>>,
    gateway: Arc<Gateway>,
    mounted: CancellationToken,
}

impl CaptureController {
    pub fn new(gateway: Arc<Gateway>, platform: Platform) -> Self {
        Self {
            session: Arc::new(Mutex::new(CaptureSession::new(platform))),
            gateway,
            mounted: CancellationToken::new(),
        }
    }

    pub fn snapshot(&self) -> CaptureSession {
        self.lock().clone()
    }

    pub fn phase(&self) -> CapturePhase {
        self.lock().phase()
    }

    /// Runs a shutter press or gallery pick and applies its result.
    ///
    /// `pick` resolves to the image URI, or `None` if the user cancelled.
    /// Returns true when the session moved to `Captured`.
    pub async fn capture<F>(&self, pick: F) -> bool
    where
        F: Future<Output = Option<String>>,
    {
        let ticket = self.lock().begin_capture();
        let uri = pick.await;
        if self.mounted.is_cancelled() {
            return false;
        }
        self.lock().capture_resolved(ticket, uri)
    }

    pub fn retake(&self) -> bool {
        self.lock().retake()
    }

    /// Uploads the captured image.
    ///
    /// # Errors
    /// Unless the session is in `Captured`.
    pub async fn use_photo(&self) -> Result<UploadOutcome, CaptureError> {
        let ticket = self.lock().use_photo(self.gateway.session().token())?;
        Ok(self.run(ticket).await)
    }

    /// Uploads the same image again after a failure.
    ///
    /// # Errors
    /// Unless the session is in `Error`.
    pub async fn retry(&self) -> Result<UploadOutcome, CaptureError> {
        let ticket = self.lock().retry(self.gateway.session().token())?;
        Ok(self.run(ticket).await)
    }

    /// Marks the screen gone; later completions are discarded.
    pub fn unmount(&self) {
        self.mounted.cancel();
    }

    async fn run(&self, ticket: UploadTicket) -> UploadOutcome {
        let result = self.send(&ticket.request).await;
        if self.mounted.is_cancelled() {
            debug!(task = ticket.id.0, "screen unmounted; upload result dropped");
            return UploadOutcome::Discarded;
        }

        let mut session = self.lock();
        if !session.upload_finished(ticket.id, result.clone()) {
            return UploadOutcome::Discarded;
        }
        match result {
            Ok(receipt) => {
                session.acknowledge();
                UploadOutcome::Uploaded(receipt)
            }
            Err(failure) => UploadOutcome::Failed(failure),
        }
    }

    async fn send(&self, request: &UploadRequest) -> Result<ScanReceipt, UploadFailure> {
        let image = request.read_image().await?;
        Ok(self.gateway.create_scan(request, image).await?)
    }

    fn lock(&self) -> MutexGuard<'_, CaptureSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

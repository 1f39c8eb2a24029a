//! Scan session state machine
//!
//! ```text
//! Idle -> Starting -> Scanning -> Succeeded -> (reset) -> Idle
//!            |            |-----> Failed ----------------> Idle
//!            |            |
//!            +------------+-----> Stopping --------------> Idle
//! ```
//!
//! The camera is held only in `Starting` and `Scanning`. Every transition out
//! of those states releases it, and so does dropping the manager.

use archivist_api::ScanError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::camera::{Camera, CameraHandle, RenderTarget, ScanConfig};
use crate::capsule::{self, Capsule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Starting,
    Scanning,
    Succeeded,
    /// Transient: the attempt ended with an error, the camera is released
    Failed,
    /// Transient: a cancel is releasing the camera
    Stopping,
}

/// What one sampling tick produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Frame sampled, no code in it
    NothingDetected,
    /// A code was read but is not a capsule. The session keeps scanning.
    Rejected(ScanError),
    /// Capsule decoded; the camera is already released
    Decoded(Capsule),
    /// The attempt ended with an error; the session is back in `Idle`
    Ended(ScanError),
    /// Cancelled; the session is back in `Idle`
    Stopped,
    /// The session is not scanning
    Inactive,
}

/// How a sampling loop finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Decoded(Capsule),
    Ended(ScanError),
    /// Cancelled, or the session was not scanning
    Stopped,
}

/// Cancels a scan session from outside the task that drives it
#[derive(Debug, Clone, Default)]
pub struct ScanCancel {
    cancelled: Arc<AtomicBool>,
}

impl ScanCancel {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Owns one camera and drives decode attempts against it
pub struct ScanSessionManager {
    camera: Arc<dyn Camera>,
    config: ScanConfig,
    state: ScanState,
    handle: Option<CameraHandle>,
    last_error: Option<ScanError>,
    capsule: Option<Capsule>,
    raw_text: Option<String>,
    invalid_reads: u32,
    cancel: ScanCancel,
}

impl ScanSessionManager {
    pub fn new(camera: Arc<dyn Camera>, config: ScanConfig) -> Self {
        Self {
            camera,
            config,
            state: ScanState::Idle,
            handle: None,
            last_error: None,
            capsule: None,
            raw_text: None,
            invalid_reads: 0,
            cancel: ScanCancel::default(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn last_error(&self) -> Option<&ScanError> {
        self.last_error.as_ref()
    }

    /// The decoded capsule, while in `Succeeded`
    pub fn capsule(&self) -> Option<&Capsule> {
        self.capsule.as_ref()
    }

    /// Text the capsule was decoded from, while in `Succeeded`
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    pub fn holds_camera(&self) -> bool {
        self.handle.as_ref().is_some_and(CameraHandle::is_live)
    }

    pub fn cancel_handle(&self) -> ScanCancel {
        self.cancel.clone()
    }

    fn transition(&mut self, next: ScanState) {
        debug!("[ScanSession] {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn release_camera(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
    }

    /// Acquire the camera and start scanning. A no-op unless `Idle`.
    pub async fn start(&mut self, target: &RenderTarget) -> Result<(), ScanError> {
        if self.state != ScanState::Idle {
            debug!("[ScanSession] start ignored in {:?}", self.state);
            return Ok(());
        }

        self.cancel.reset();
        self.last_error = None;
        self.capsule = None;
        self.raw_text = None;
        self.invalid_reads = 0;
        self.transition(ScanState::Starting);

        match self.camera.acquire(target, &self.config).await {
            Ok(pipeline) => {
                self.handle = Some(CameraHandle::new(pipeline));
                if self.cancel.is_cancelled() {
                    self.stop();
                    return Ok(());
                }
                info!(
                    "[ScanSession] Scanning into '{}' at {} fps, window {}x{}",
                    target.as_str(),
                    self.config.fps,
                    self.config.window.width,
                    self.config.window.height
                );
                self.transition(ScanState::Scanning);
                Ok(())
            }
            Err(e) => {
                let error = ScanError::DeviceUnavailable {
                    message: e.to_string(),
                };
                warn!("[ScanSession] {}", error);
                self.last_error = Some(error.clone());
                self.transition(ScanState::Idle);
                Err(error)
            }
        }
    }

    /// Sample one frame and handle whatever it holds
    pub async fn tick(&mut self) -> ScanEvent {
        if self.cancel.is_cancelled()
            && matches!(self.state, ScanState::Starting | ScanState::Scanning)
        {
            self.stop();
            return ScanEvent::Stopped;
        }
        if self.state != ScanState::Scanning {
            return ScanEvent::Inactive;
        }

        let sampled = match self.handle.as_mut() {
            Some(handle) => handle.sample().await,
            None => {
                return self.fail(ScanError::DeviceUnavailable {
                    message: "capture pipeline missing".to_string(),
                })
            }
        };

        match sampled {
            Ok(Some(raw)) => self.handle_read(&raw),
            Ok(None) => ScanEvent::NothingDetected,
            Err(e) => self.fail(ScanError::DeviceUnavailable {
                message: e.to_string(),
            }),
        }
    }

    /// Handle one decoded raw text
    ///
    /// A valid capsule ends the attempt in `Succeeded` with the camera
    /// released. Anything else is rejected and scanning goes on.
    pub fn handle_read(&mut self, raw: &str) -> ScanEvent {
        if self.state != ScanState::Scanning {
            return ScanEvent::Inactive;
        }

        match capsule::decode(raw) {
            Ok(capsule) => {
                self.release_camera();
                self.invalid_reads = 0;
                self.last_error = None;
                self.capsule = Some(capsule.clone());
                self.raw_text = Some(raw.to_string());
                self.transition(ScanState::Succeeded);
                info!("[ScanSession] Decoded capsule of document {}", capsule.id);
                ScanEvent::Decoded(capsule)
            }
            Err(source) => {
                let error = ScanError::InvalidCapsule { source };
                self.invalid_reads += 1;
                debug!(
                    "[ScanSession] Rejected read #{}: {}",
                    self.invalid_reads, error
                );

                if let Some(limit) = self.config.max_invalid_reads {
                    if self.invalid_reads >= limit {
                        return self.fail(error);
                    }
                }
                self.last_error = Some(error.clone());
                ScanEvent::Rejected(error)
            }
        }
    }

    fn fail(&mut self, error: ScanError) -> ScanEvent {
        warn!("[ScanSession] Attempt ended: {}", error);
        self.release_camera();
        self.last_error = Some(error.clone());
        self.transition(ScanState::Failed);
        self.transition(ScanState::Idle);
        ScanEvent::Ended(error)
    }

    /// Cancel the attempt and release the camera. Safe to call in any state.
    pub fn stop(&mut self) {
        if matches!(self.state, ScanState::Starting | ScanState::Scanning) {
            self.transition(ScanState::Stopping);
            self.release_camera();
            self.transition(ScanState::Idle);
        } else {
            self.release_camera();
        }
    }

    /// Stop if needed and forget the last result, ready for another scan
    pub fn reset(&mut self) {
        self.stop();
        self.capsule = None;
        self.raw_text = None;
        self.last_error = None;
        self.invalid_reads = 0;
        if self.state != ScanState::Idle {
            self.transition(ScanState::Idle);
        }
    }

    /// Sample at the configured rate until the attempt ends
    ///
    /// `on_event` sees every event, including rejected reads.
    pub async fn run<F>(&mut self, mut on_event: F) -> ScanOutcome
    where
        F: FnMut(&ScanEvent),
    {
        let mut ticker = tokio::time::interval(self.config.sample_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = self.tick().await;
            on_event(&event);

            match event {
                ScanEvent::Decoded(capsule) => return ScanOutcome::Decoded(capsule),
                ScanEvent::Ended(error) => return ScanOutcome::Ended(error),
                ScanEvent::Stopped | ScanEvent::Inactive => return ScanOutcome::Stopped,
                ScanEvent::NothingDetected | ScanEvent::Rejected(_) => {}
            }
        }
    }
}

impl Drop for ScanSessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::camera::CameraError;
    use crate::scan::scripted::{ScriptedCamera, ScriptedFrame};

    const CAPSULE: &str = r#"{"id": 1, "title": "Invoice A", "department": "Finance"}"#;

    fn manager(camera: &ScriptedCamera, config: ScanConfig) -> ScanSessionManager {
        ScanSessionManager::new(Arc::new(camera.clone()), config)
    }

    fn target() -> RenderTarget {
        RenderTarget::new("qr-reader")
    }

    #[tokio::test]
    async fn test_foreign_code_then_capsule() {
        let camera = ScriptedCamera::new([
            ScriptedFrame::code("https://example.com/not-a-capsule"),
            ScriptedFrame::code(CAPSULE),
        ]);
        let mut session = manager(&camera, ScanConfig::default());
        session.start(&target()).await.unwrap();
        assert_eq!(session.state(), ScanState::Scanning);

        let first = session.tick().await;
        assert!(matches!(
            first,
            ScanEvent::Rejected(ScanError::InvalidCapsule { .. })
        ));
        assert_eq!(session.state(), ScanState::Scanning);
        assert!(session.holds_camera());

        let second = session.tick().await;
        let ScanEvent::Decoded(capsule) = second else {
            panic!("expected a decoded capsule, got {:?}", second);
        };
        assert_eq!(capsule.id, 1);
        assert_eq!(session.state(), ScanState::Succeeded);
        assert_eq!(session.raw_text(), Some(CAPSULE));
        assert!(!session.holds_camera());
        assert_eq!(camera.releases(), 1);

        drop(session);
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_camera_returns_to_idle() {
        let camera = ScriptedCamera::unavailable(CameraError::PermissionDenied);
        let mut session = manager(&camera, ScanConfig::default());

        let err = session.start(&target()).await.unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable { .. }));
        assert_eq!(session.state(), ScanState::Idle);
        assert_eq!(session.last_error(), Some(&err));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let camera = ScriptedCamera::new([]);
        let mut session = manager(&camera, ScanConfig::default());

        session.start(&target()).await.unwrap();
        session.start(&target()).await.unwrap();

        assert_eq!(camera.acquisitions(), 1);
        assert_eq!(session.state(), ScanState::Scanning);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_releases_once() {
        let camera = ScriptedCamera::new([]);
        let mut session = manager(&camera, ScanConfig::default());
        session.stop();
        assert_eq!(session.state(), ScanState::Idle);

        session.start(&target()).await.unwrap();
        session.stop();
        session.stop();

        assert_eq!(session.state(), ScanState::Idle);
        assert_eq!(camera.releases(), 1);
        assert!(!camera.in_use());
    }

    #[tokio::test]
    async fn test_drop_releases_camera() {
        let camera = ScriptedCamera::new([]);
        {
            let mut session = manager(&camera, ScanConfig::default());
            session.start(&target()).await.unwrap();
            assert!(camera.in_use());
        }
        assert!(!camera.in_use());
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_two_managers_cannot_share_the_camera() {
        let camera = ScriptedCamera::new([]);
        let mut first = manager(&camera, ScanConfig::default());
        let mut second = manager(&camera, ScanConfig::default());

        first.start(&target()).await.unwrap();
        let err = second.start(&target()).await.unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable { .. }));
        assert_eq!(second.state(), ScanState::Idle);

        first.stop();
        second.start(&target()).await.unwrap();
        assert_eq!(second.state(), ScanState::Scanning);
    }

    #[tokio::test]
    async fn test_device_loss_ends_in_idle() {
        let camera = ScriptedCamera::new([ScriptedFrame::Empty, ScriptedFrame::DeviceLost]);
        let mut session = manager(&camera, ScanConfig::default());
        session.start(&target()).await.unwrap();

        assert_eq!(session.tick().await, ScanEvent::NothingDetected);
        let event = session.tick().await;
        assert!(matches!(
            event,
            ScanEvent::Ended(ScanError::DeviceUnavailable { .. })
        ));
        assert_eq!(session.state(), ScanState::Idle);
        assert_eq!(camera.releases(), 1);

        // restartable after the failure
        session.start(&target()).await.unwrap();
        assert_eq!(session.state(), ScanState::Scanning);
    }

    #[tokio::test]
    async fn test_cancel_handle_stops_the_loop() {
        let camera = ScriptedCamera::new([]);
        let mut session = manager(&camera, ScanConfig::default());
        session.start(&target()).await.unwrap();

        let cancel = session.cancel_handle();
        cancel.cancel();

        assert_eq!(session.run(|_| {}).await, ScanOutcome::Stopped);
        assert_eq!(session.state(), ScanState::Idle);
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_bounded_invalid_reads() {
        let camera = ScriptedCamera::new([
            ScriptedFrame::code("noise"),
            ScriptedFrame::code("{\"id\": 3}"),
            ScriptedFrame::code(CAPSULE),
        ]);
        let config = ScanConfig {
            max_invalid_reads: Some(2),
            ..ScanConfig::default()
        };
        let mut session = manager(&camera, config);
        session.start(&target()).await.unwrap();

        let mut rejected = 0;
        let outcome = session
            .run(|event| {
                if matches!(event, ScanEvent::Rejected(_)) {
                    rejected += 1;
                }
            })
            .await;

        assert_eq!(rejected, 1);
        assert!(matches!(
            outcome,
            ScanOutcome::Ended(ScanError::InvalidCapsule { .. })
        ));
        assert_eq!(session.state(), ScanState::Idle);
        assert!(!camera.in_use());
    }

    #[tokio::test]
    async fn test_reset_after_success() {
        let camera = ScriptedCamera::new([ScriptedFrame::code(CAPSULE)]);
        let mut session = manager(&camera, ScanConfig::default());
        session.start(&target()).await.unwrap();
        session.tick().await;
        assert_eq!(session.state(), ScanState::Succeeded);

        // start is ignored until the result is dismissed
        session.start(&target()).await.unwrap();
        assert_eq!(camera.acquisitions(), 1);

        assert_eq!(session.raw_text(), Some(CAPSULE));

        session.reset();
        assert_eq!(session.state(), ScanState::Idle);
        assert!(session.capsule().is_none());
        assert!(session.raw_text().is_none());

        session.start(&target()).await.unwrap();
        assert_eq!(camera.acquisitions(), 2);
    }

    #[tokio::test]
    async fn test_handle_read_outside_scanning_is_inactive() {
        let camera = ScriptedCamera::new([]);
        let mut session = manager(&camera, ScanConfig::default());
        assert_eq!(session.handle_read(CAPSULE), ScanEvent::Inactive);
        assert_eq!(session.tick().await, ScanEvent::Inactive);
    }
}

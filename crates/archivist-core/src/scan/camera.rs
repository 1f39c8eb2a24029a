use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FPS: u32 = 10;
pub const DEFAULT_WINDOW_SIZE: u32 = 250;

/// Surface the capture preview is rendered into (element id, window name, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget(String);

impl RenderTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Region of the captured frame searched for a code, in logical units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionWindow {
    pub width: u32,
    pub height: u32,
}

impl Default for DetectionWindow {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_SIZE,
            height: DEFAULT_WINDOW_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Frames sampled per second
    pub fps: u32,
    pub window: DetectionWindow,
    /// Consecutive invalid capsules that end an attempt. `None` keeps scanning forever.
    pub max_invalid_reads: Option<u32>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            window: DetectionWindow::default(),
            max_invalid_reads: None,
        }
    }
}

impl ScanConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("no camera found")]
    NotFound,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera is in use by another scan session")]
    Busy,

    #[error("camera lost: {message}")]
    Lost { message: String },

    #[error("capture pipeline already released")]
    Released,
}

/// A camera that can be acquired exclusively
#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquire the device and start a capture pipeline rendering into `target`
    async fn acquire(
        &self,
        target: &RenderTarget,
        config: &ScanConfig,
    ) -> Result<Box<dyn CapturePipeline>, CameraError>;
}

/// A live camera-to-frame path
#[async_trait]
pub trait CapturePipeline: Send {
    /// Sample one frame. `Ok(Some(text))` when a code was decoded inside the
    /// detection window, `Ok(None)` when the frame held none.
    async fn sample(&mut self) -> Result<Option<String>, CameraError>;

    /// Stop capturing and give the device back
    fn release(&mut self);
}

/// Scoped ownership of a capture pipeline
///
/// The pipeline is released exactly once: by `release`, or on drop.
pub struct CameraHandle {
    pipeline: Option<Box<dyn CapturePipeline>>,
}

impl CameraHandle {
    pub fn new(pipeline: Box<dyn CapturePipeline>) -> Self {
        Self {
            pipeline: Some(pipeline),
        }
    }

    pub fn is_live(&self) -> bool {
        self.pipeline.is_some()
    }

    pub async fn sample(&mut self) -> Result<Option<String>, CameraError> {
        match self.pipeline.as_mut() {
            Some(pipeline) => pipeline.sample().await,
            None => Err(CameraError::Released),
        }
    }

    /// Returns false when the pipeline was already released
    pub fn release(&mut self) -> bool {
        match self.pipeline.take() {
            Some(mut pipeline) => {
                pipeline.release();
                debug!("[CameraHandle] Capture pipeline released");
                true
            }
            None => false,
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release();
    }
}

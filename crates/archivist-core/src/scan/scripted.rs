//! Camera that plays back a script of frames
//!
//! Stands in for real hardware in tests and demos. It enforces the same
//! exclusivity a device does (one live pipeline at a time) and counts
//! acquisitions and releases so leaks show up.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::camera::{Camera, CameraError, CapturePipeline, RenderTarget, ScanConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFrame {
    /// A frame without any code in the detection window
    Empty,
    /// A frame in which a code decoded to this text
    Code(String),
    /// The device disappears while sampling this frame
    DeviceLost,
}

impl ScriptedFrame {
    pub fn code(text: impl Into<String>) -> Self {
        ScriptedFrame::Code(text.into())
    }
}

#[derive(Default)]
struct Shared {
    frames: Mutex<VecDeque<ScriptedFrame>>,
    in_use: AtomicBool,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl Shared {
    fn next_frame(&self) -> Option<ScriptedFrame> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[derive(Clone, Default)]
pub struct ScriptedCamera {
    shared: Arc<Shared>,
    unavailable: Option<CameraError>,
}

impl ScriptedCamera {
    pub fn new(frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        let camera = Self::default();
        camera.push_frames(frames);
        camera
    }

    /// A camera whose acquisition always fails with `error`
    pub fn unavailable(error: CameraError) -> Self {
        Self {
            unavailable: Some(error),
            ..Self::default()
        }
    }

    pub fn push_frames(&self, frames: impl IntoIterator<Item = ScriptedFrame>) {
        self.shared
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(frames);
    }

    pub fn acquisitions(&self) -> usize {
        self.shared.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.shared.releases.load(Ordering::SeqCst)
    }

    pub fn in_use(&self) -> bool {
        self.shared.in_use.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for ScriptedCamera {
    async fn acquire(
        &self,
        _target: &RenderTarget,
        _config: &ScanConfig,
    ) -> Result<Box<dyn CapturePipeline>, CameraError> {
        if let Some(error) = &self.unavailable {
            return Err(error.clone());
        }
        if self.shared.in_use.swap(true, Ordering::SeqCst) {
            return Err(CameraError::Busy);
        }
        self.shared.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedPipeline {
            shared: Arc::clone(&self.shared),
            released: false,
        }))
    }
}

struct ScriptedPipeline {
    shared: Arc<Shared>,
    released: bool,
}

#[async_trait]
impl CapturePipeline for ScriptedPipeline {
    async fn sample(&mut self) -> Result<Option<String>, CameraError> {
        if self.released {
            return Err(CameraError::Released);
        }
        match self.shared.next_frame() {
            Some(ScriptedFrame::Code(text)) => Ok(Some(text)),
            Some(ScriptedFrame::Empty) | None => Ok(None),
            Some(ScriptedFrame::DeviceLost) => Err(CameraError::Lost {
                message: "scripted device loss".to_string(),
            }),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.in_use.store(false, Ordering::SeqCst);
            self.shared.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

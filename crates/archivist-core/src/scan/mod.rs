//! Camera-backed scan sessions
//!
//! - `camera` - the camera seam (`Camera`, `CapturePipeline`) and the scoped `CameraHandle`
//! - `session` - `ScanSessionManager`, the state machine around one camera
//! - `scripted` - a camera that plays back scripted frames

pub mod camera;
pub mod scripted;
pub mod session;

pub use camera::{
    Camera, CameraError, CameraHandle, CapturePipeline, DetectionWindow, RenderTarget, ScanConfig,
};
pub use scripted::{ScriptedCamera, ScriptedFrame};
pub use session::{ScanCancel, ScanEvent, ScanOutcome, ScanSessionManager, ScanState};

//! Camera fed by text lines
//!
//! Each non-blank line is treated as the text of one decoded QR code, which
//! lets a hardware scanner in keyboard-wedge mode (or a file of captured
//! codes) drive a scan session.

use archivist_core::scan::{Camera, CameraError, CapturePipeline, RenderTarget, ScanConfig};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum LineSource {
    Stdin,
    File(PathBuf),
}

pub struct LineCamera {
    source: LineSource,
    in_use: Arc<AtomicBool>,
}

impl LineCamera {
    pub fn new(source: LineSource) -> Self {
        Self {
            source,
            in_use: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn open(&self) -> Result<Box<dyn AsyncBufRead + Send + Unpin>, CameraError> {
        match &self.source {
            LineSource::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
            LineSource::File(path) => {
                let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => CameraError::NotFound,
                    std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
                    _ => CameraError::Lost {
                        message: format!("{}: {}", path.display(), e),
                    },
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

#[async_trait]
impl Camera for LineCamera {
    async fn acquire(
        &self,
        target: &RenderTarget,
        _config: &ScanConfig,
    ) -> Result<Box<dyn CapturePipeline>, CameraError> {
        if self.in_use.swap(true, Ordering::SeqCst) {
            return Err(CameraError::Busy);
        }
        let reader = match self.open().await {
            Ok(reader) => reader,
            Err(e) => {
                self.in_use.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        debug!("[LineCamera] Reading {:?} into '{}'", self.source, target.as_str());
        Ok(Box::new(LinePipeline {
            lines: reader.lines(),
            in_use: Arc::clone(&self.in_use),
            released: false,
        }))
    }
}

struct LinePipeline {
    lines: Lines<Box<dyn AsyncBufRead + Send + Unpin>>,
    in_use: Arc<AtomicBool>,
    released: bool,
}

#[async_trait]
impl CapturePipeline for LinePipeline {
    async fn sample(&mut self) -> Result<Option<String>, CameraError> {
        if self.released {
            return Err(CameraError::Released);
        }
        match self.lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Ok(None),
            Ok(Some(line)) => Ok(Some(line)),
            Ok(None) => Err(CameraError::Lost {
                message: "input closed".to_string(),
            }),
            Err(e) => Err(CameraError::Lost {
                message: e.to_string(),
            }),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.in_use.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_core::scan::{ScanOutcome, ScanSessionManager};
    use archivist_core::ScanError;

    fn temp_input(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "archivist-line-camera-{}-{}.txt",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_lines_drive_a_scan() {
        let path = temp_input(
            "scan",
            "\nnot a capsule\n{\"id\": 12, \"title\": \"Deed\", \"departement\": \"Legal\"}\n",
        );
        let camera = Arc::new(LineCamera::new(LineSource::File(path.clone())));
        let mut session = ScanSessionManager::new(camera, ScanConfig::default());
        session.start(&RenderTarget::new("stdin")).await.unwrap();

        let outcome = session.run(|_| {}).await;
        let ScanOutcome::Decoded(capsule) = outcome else {
            panic!("expected a capsule, got {:?}", outcome);
        };
        assert_eq!(capsule.id, 12);
        assert_eq!(capsule.department.as_deref(), Some("Legal"));
        assert!(!session.holds_camera());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_end_of_input_ends_the_attempt() {
        let path = temp_input("eof", "garbage\n");
        let camera = Arc::new(LineCamera::new(LineSource::File(path.clone())));
        let mut session = ScanSessionManager::new(camera, ScanConfig::default());
        session.start(&RenderTarget::new("stdin")).await.unwrap();

        let outcome = session.run(|_| {}).await;
        assert!(matches!(
            outcome,
            ScanOutcome::Ended(ScanError::DeviceUnavailable { .. })
        ));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let camera = Arc::new(LineCamera::new(LineSource::File(PathBuf::from(
            "/nonexistent/archivist/codes.txt",
        ))));
        let mut session = ScanSessionManager::new(camera, ScanConfig::default());

        let err = session.start(&RenderTarget::new("stdin")).await.unwrap_err();
        assert!(matches!(err, ScanError::DeviceUnavailable { .. }));
    }
}

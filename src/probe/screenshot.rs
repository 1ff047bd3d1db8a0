use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::external::runner::run_capture;
use crate::utils::{ensure_dir, sanitize_file_component};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("could not prepare screenshot directory: {0}")]
    Directory(String),
    #[error("could not run screenshot tool: {0}")]
    Spawn(String),
    #[error("screenshot tool exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Screenshot collaborator; writes an image file as a side effect.
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    async fn capture(&self, url: &str, destination: &Path) -> Result<(), CaptureError>;
}

pub struct Gowitness {
    bin: String,
}

impl Gowitness {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl ScreenshotCapture for Gowitness {
    async fn capture(&self, url: &str, destination: &Path) -> Result<(), CaptureError> {
        if let Some(dir) = destination.parent() {
            ensure_dir(dir).map_err(|e| CaptureError::Directory(e.to_string()))?;
        }
        let args = vec![
            "single".to_string(),
            url.to_string(),
            "-o".to_string(),
            destination.display().to_string(),
            "--disable-db".to_string(),
        ];
        let out = run_capture(&self.bin, &args).await.map_err(|e| CaptureError::Spawn(e.to_string()))?;
        if !out.success {
            return Err(CaptureError::Failed { code: out.code, stderr: out.stderr.trim().to_string() });
        }
        Ok(())
    }
}

/// `<dir>/<domain>_<ip>_<stamp>_<scheme>.png`
pub fn screenshot_path(dir: &Path, domain: &str, ip: &str, timestamp: &str, scheme: &str) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}_{}.png",
        sanitize_file_component(domain),
        ip,
        timestamp,
        scheme
    ))
}

/// Best-effort capture: failures are logged and never returned.
pub async fn capture_screenshot(capture: &dyn ScreenshotCapture, url: &str, destination: &Path) {
    match capture.capture(url, destination).await {
        Ok(()) => info!(url, path = %destination.display(), "Captured screenshot"),
        Err(e) => debug!(url, error = %e, "Failed to capture screenshot"),
    }
}

use async_trait::async_trait;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use recon::models::PortScan;
use recon::probe::ports::ScanError;
use recon::probe::screenshot::CaptureError;
use recon::probe::{capture_screenshot, scan_ports, PortScanner, ScreenshotCapture};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct BrokenScanner;

#[async_trait]
impl PortScanner for BrokenScanner {
    async fn scan(&self, _ip: Ipv4Addr, _ports: &[u16]) -> Result<Option<PortScan>, ScanError> {
        Err(ScanError::Failed { code: Some(1), stderr: "QUITTING!".into() })
    }
}

struct BrokenCamera;

#[async_trait]
impl ScreenshotCapture for BrokenCamera {
    async fn capture(&self, _url: &str, _destination: &Path) -> Result<(), CaptureError> {
        Err(CaptureError::Spawn("gowitness: not found".into()))
    }
}

async fn log_failures_at(level: Level) -> String {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(captured.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    assert!(scan_ports(&BrokenScanner, Ipv4Addr::new(10, 0, 0, 1), &[80]).await.is_none());
    capture_screenshot(&BrokenCamera, "http://acme.com", Path::new("shots/x.png")).await;
    captured.text()
}

#[tokio::test]
async fn target_failures_are_quiet_by_default() {
    assert_eq!(log_failures_at(Level::INFO).await, "");
}

#[tokio::test]
async fn target_failures_show_when_verbose() {
    let text = log_failures_at(Level::DEBUG).await;
    assert!(text.contains("Port scan failed"));
    assert!(text.contains("Failed to capture screenshot"));
}

//! Camera-capture emotion detection loop
//!
//! `DetectionController` owns a camera and a detection backend. While
//! detection is active a `PeriodicTask` captures one frame per second,
//! base64-encodes it and forwards it to the backend. The camera is acquired
//! on `start_camera` and released on `stop_camera` or when the controller is
//! dropped.

mod folder;
mod http;

pub use folder::FolderCamera;
pub use http::HttpDetectionBackend;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use freya_common::api::{DetectionRequest, DetectionResult, PlaylistArtifacts};
use freya_common::PeriodicTask;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fixed capture period while detection is active
pub const CAPTURE_INTERVAL: Duration = Duration::from_secs(1);

/// Capture loop errors
///
/// Display strings are what the user sees as the current error.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Please start the camera first")]
    CameraInactive,

    #[error("No emotion detected yet")]
    NoEmotion,

    #[error("Could not access camera: {0}")]
    CameraUnavailable(String),

    #[error("Frame capture failed: {0}")]
    Frame(String),

    /// Message relayed from the gateway's `{ error }` envelope
    #[error("{0}")]
    Backend(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Exclusive video source
pub trait Camera: Send + 'static {
    /// Acquire the stream
    fn open(&mut self) -> Result<(), CaptureError>;
    /// Release the stream; no-op when already closed
    fn close(&mut self);
    fn is_open(&self) -> bool;
    /// Current frame as JPEG bytes
    fn capture_jpeg(&mut self) -> Result<Vec<u8>, CaptureError>;
}

/// Remote side of the loop: image detection and playlist creation
#[async_trait]
pub trait DetectionBackend: Send + Sync + 'static {
    async fn detect(&self, request: DetectionRequest) -> Result<DetectionResult, CaptureError>;
    async fn create_playlist(&self, emotion: &str) -> Result<PlaylistArtifacts, CaptureError>;
}

/// What a view would render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSnapshot {
    pub camera_active: bool,
    pub detecting: bool,
    pub emotion: Option<String>,
    pub confidence: f64,
    pub error: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Start/stop lifecycle for camera and detection
pub struct DetectionController<C: Camera, B: DetectionBackend> {
    camera: Arc<Mutex<C>>,
    backend: Arc<B>,
    snapshot: Arc<Mutex<DetectionSnapshot>>,
    task: Option<PeriodicTask>,
    interval: Duration,
}

impl<C: Camera, B: DetectionBackend> DetectionController<C, B> {
    pub fn new(camera: C, backend: B) -> Self {
        Self::with_interval(camera, backend, CAPTURE_INTERVAL)
    }

    pub fn with_interval(camera: C, backend: B, interval: Duration) -> Self {
        Self {
            camera: Arc::new(Mutex::new(camera)),
            backend: Arc::new(backend),
            snapshot: Arc::new(Mutex::new(DetectionSnapshot::default())),
            task: None,
            interval,
        }
    }

    pub fn start_camera(&mut self) -> Result<(), CaptureError> {
        let opened = lock(&self.camera).open();
        let mut snapshot = lock(&self.snapshot);
        match opened {
            Ok(()) => {
                snapshot.camera_active = true;
                info!("Camera started");
                Ok(())
            }
            Err(e) => {
                snapshot.error = Some(e.to_string());
                warn!("Camera error: {}", e);
                Err(e)
            }
        }
    }

    /// Release the camera; also stops detection
    pub fn stop_camera(&mut self) {
        lock(&self.camera).close();
        lock(&self.snapshot).camera_active = false;
        self.stop_detection();
    }

    /// Begin periodic capture
    ///
    /// Fails without touching the backend when the camera is not active.
    pub fn start_detection(&mut self) -> Result<(), CaptureError> {
        if !lock(&self.camera).is_open() {
            let err = CaptureError::CameraInactive;
            lock(&self.snapshot).error = Some(err.to_string());
            return Err(err);
        }

        {
            let mut snapshot = lock(&self.snapshot);
            snapshot.detecting = true;
            snapshot.error = None;
        }

        if self.task.is_some() {
            return Ok(());
        }

        let camera = self.camera.clone();
        let backend = self.backend.clone();
        let snapshot = self.snapshot.clone();
        self.task = Some(PeriodicTask::spawn("emotion-detection", self.interval, move || {
            let camera = camera.clone();
            let backend = backend.clone();
            let snapshot = snapshot.clone();
            async move { capture_and_analyze(camera, backend.as_ref(), &snapshot).await }
        }));

        info!(interval_ms = self.interval.as_millis() as u64, "Detection started");
        Ok(())
    }

    /// Cancel periodic capture; no frame is captured afterwards
    pub fn stop_detection(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            info!("Detection stopped");
        }
        lock(&self.snapshot).detecting = false;
    }

    /// Create a playlist from the latest detected emotion
    pub async fn create_playlist(&self) -> Result<PlaylistArtifacts, CaptureError> {
        let emotion = lock(&self.snapshot).emotion.clone();
        let Some(emotion) = emotion else {
            let err = CaptureError::NoEmotion;
            lock(&self.snapshot).error = Some(err.to_string());
            return Err(err);
        };

        match self.backend.create_playlist(&emotion).await {
            Ok(playlist) => Ok(playlist),
            Err(e) => {
                lock(&self.snapshot).error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        lock(&self.snapshot).clone()
    }

    pub fn is_detecting(&self) -> bool {
        self.task.is_some()
    }
}

impl<C: Camera, B: DetectionBackend> Drop for DetectionController<C, B> {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

/// Grab one frame on the blocking pool
///
/// Camera reads are synchronous device or file I/O under the camera lock.
/// `None` when the camera was closed in the meantime.
async fn capture_frame<C: Camera>(
    camera: Arc<Mutex<C>>,
) -> Result<Option<Vec<u8>>, CaptureError> {
    tokio::task::spawn_blocking(move || {
        let mut camera = lock(&camera);
        if !camera.is_open() {
            return Ok(None);
        }
        camera.capture_jpeg().map(Some)
    })
    .await
    .map_err(|e| CaptureError::Frame(format!("capture task failed: {e}")))?
}

async fn capture_and_analyze<C: Camera, B: DetectionBackend>(
    camera: Arc<Mutex<C>>,
    backend: &B,
    snapshot: &Mutex<DetectionSnapshot>,
) {
    let frame = match capture_frame(camera).await {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(e) => {
            lock(snapshot).error = Some(e.to_string());
            return;
        }
    };

    debug!(bytes = frame.len(), "Captured frame");
    let request = DetectionRequest {
        image: STANDARD.encode(&frame),
    };

    match backend.detect(request).await {
        Ok(DetectionResult {
            emotion: Some(emotion),
            confidence,
        }) => {
            let mut snapshot = lock(snapshot);
            snapshot.emotion = Some(emotion);
            snapshot.confidence = confidence.unwrap_or(0.0);
        }
        Ok(_) => debug!("No emotion in frame"),
        Err(e) => {
            warn!("Frame analysis error: {}", e);
            lock(snapshot).error = Some(e.to_string());
        }
    }
}

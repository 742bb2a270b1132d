//! Camera backed by a directory of JPEG frames
//!
//! Frames are read in file-name order and replayed in a loop. Useful for
//! driving the detection loop on machines without a webcam.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Camera, CaptureError};

pub struct FolderCamera {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    next: usize,
    open: bool,
}

impl FolderCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frames: Vec::new(),
            next: 0,
            open: false,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

impl Camera for FolderCamera {
    fn open(&mut self) -> Result<(), CaptureError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            CaptureError::CameraUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_jpeg(path))
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(CaptureError::CameraUnavailable(format!(
                "no JPEG frames in {}",
                self.dir.display()
            )));
        }

        debug!(dir = %self.dir.display(), frames = frames.len(), "Opened frame folder");
        self.frames = frames;
        self.next = 0;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.frames.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn capture_jpeg(&mut self) -> Result<Vec<u8>, CaptureError> {
        if !self.open {
            return Err(CaptureError::CameraInactive);
        }
        let path = &self.frames[self.next % self.frames.len()];
        self.next = (self.next + 1) % self.frames.len();

        std::fs::read(path).map_err(|e| CaptureError::Frame(format!("{}: {}", path.display(), e)))
    }
}

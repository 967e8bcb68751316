#![allow(dead_code)]

use async_trait::async_trait;
use captioner::CaptionModel;
use color_eyre::Result;
use color_eyre::eyre::bail;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::process::Command;

/// Captions every request with the file name of its first image and remembers the requests.
#[derive(Default)]
pub struct RecordingModel {
    requests: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingModel {
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<Vec<PathBuf>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn first_images(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|images| images.first()?.file_name()?.to_str().map(String::from))
            .collect()
    }
}

#[async_trait]
impl CaptionModel for RecordingModel {
    async fn caption(&self, images: &[PathBuf]) -> Result<String> {
        let name = images
            .first()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(images.to_vec());
        }
        Ok(format!("  A picture called {name}.\n"))
    }
}

/// Whether `ffmpeg` and `ffprobe` can be run.
pub async fn ffmpeg_available() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        let ok = Command::new(tool)
            .arg("-version")
            .output()
            .await
            .is_ok_and(|o| o.status.success());
        if !ok {
            return false;
        }
    }
    true
}

/// Writes a 320x240, 25 fps test pattern video of exactly `frames` frames.
pub async fn write_test_clip(path: &Path, frames: u32) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", "testsrc=size=320x240:rate=25"])
        .args(["-frames:v", &frames.to_string(), "-pix_fmt", "yuv420p"])
        .arg(path)
        .status()
        .await?;
    if !status.success() {
        bail!("cannot create test clip {}", path.display());
    }
    Ok(())
}

/// File names in `folder`, sorted.
pub fn file_names(folder: &Path) -> Result<Vec<String>> {
    let mut names = vec![];
    for entry in std::fs::read_dir(folder)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

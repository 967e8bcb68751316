use color_eyre::eyre::{Context, Result, eyre};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Where sources are read from and outputs written to, relative to an input folder.
///
/// ```text
/// <input>/img/                      source images
/// <input>/vid/                      source videos
/// <input>/input/images/<name>.txt   image captions, next to the resized images
/// <input>/input/videos/<name>.txt   video captions, next to the rescaled videos
/// <input>/input/videos/<name>_frames/frame_NNN.jpg
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionLayout {
    pub image_sources: PathBuf,
    pub video_sources: PathBuf,
    pub image_outputs: PathBuf,
    pub video_outputs: PathBuf,
}

impl CaptionLayout {
    pub fn new(input_folder: &Path) -> Self {
        Self {
            image_sources: input_folder.join("img"),
            video_sources: input_folder.join("vid"),
            image_outputs: input_folder.join("input").join("images"),
            video_outputs: input_folder.join("input").join("videos"),
        }
    }
}

/// One source file and every path derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub source: PathBuf,
    /// Resized image or rescaled video.
    pub output: PathBuf,
    pub caption_path: PathBuf,
    /// Only set for videos.
    pub frames_folder: Option<PathBuf>,
}

impl MediaItem {
    pub fn new(kind: MediaKind, source: &Path, output_dir: &Path) -> Result<Self> {
        let file_name = source
            .file_name()
            .ok_or_else(|| eyre!("{} has no file name", source.display()))?;
        let stem = source
            .file_stem()
            .ok_or_else(|| eyre!("{} has no file stem", source.display()))?
            .to_string_lossy();

        let frames_folder = match kind {
            MediaKind::Image => None,
            MediaKind::Video => Some(output_dir.join(format!("{stem}_frames"))),
        };

        Ok(Self {
            kind,
            source: source.to_path_buf(),
            output: output_dir.join(file_name),
            caption_path: output_dir.join(format!("{stem}.txt")),
            frames_folder,
        })
    }
}

/// Files directly inside `folder` accepted by `is_media`, sorted by file name.
pub fn discover_media(folder: &Path, is_media: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.wrap_err_with(|| format!("cannot list {}", folder.display()))?;
        if entry.file_type().is_file() && is_media(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

use crate::{
    LanguageModelSettings, LoggingSettings, MediaSettings, RawSettings, lowercase_extension,
};
use color_eyre::eyre::{Report, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf, absolute};

/// Frame counts a sampled video may end up with, ascending.
pub const DEFAULT_FRAME_COUNT_OPTIONS: [u32; 5] = [49, 57, 65, 73, 81];

/// Upper bound for `max_frames` and the frame count options. Frame files are named
/// with a three digit index.
pub const MAX_FRAMES_PER_VIDEO: u32 = 999;

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub captioning: CaptioningSettings,
    pub language_model: LanguageModelSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaptioningSettings {
    pub input_folder: PathBuf,
    pub process_images: bool,
    pub process_videos: bool,
    pub overwrite_captions: bool,
    pub fps_divisor: u32,
    pub max_frames: u32,
    pub media: MediaSettings,
}

impl TryFrom<RawSettings> for AppSettings {
    type Error = Report;

    fn try_from(raw: RawSettings) -> Result<Self> {
        let captioning = raw.captioning;
        if captioning.fps_divisor == 0 {
            bail!("captioning.fps_divisor must be at least 1");
        }
        if !(1..=MAX_FRAMES_PER_VIDEO).contains(&captioning.max_frames) {
            bail!(
                "captioning.max_frames must be between 1 and {MAX_FRAMES_PER_VIDEO}, got {}",
                captioning.max_frames
            );
        }
        if captioning.media.frame_count_options.is_empty() {
            bail!("captioning.media.frame_count_options must not be empty");
        }
        if let Some(option) = captioning
            .media
            .frame_count_options
            .iter()
            .find(|&&option| !(1..=MAX_FRAMES_PER_VIDEO).contains(&option))
        {
            bail!(
                "captioning.media.frame_count_options must lie between 1 and {MAX_FRAMES_PER_VIDEO}, got {option}"
            );
        }
        let max_video_size = captioning.media.max_video_size;
        if max_video_size == 0 || max_video_size % 2 != 0 {
            bail!("captioning.media.max_video_size must be a positive even number, got {max_video_size}");
        }
        let mut media = captioning.media;
        media.frame_count_options.sort_unstable();
        media.frame_count_options.dedup();

        Ok(Self {
            captioning: CaptioningSettings {
                input_folder: absolute(&captioning.input_folder)?,
                process_images: captioning.process_images,
                process_videos: captioning.process_videos,
                overwrite_captions: captioning.overwrite_captions,
                fps_divisor: captioning.fps_divisor,
                max_frames: captioning.max_frames,
                media,
            },
            language_model: raw.language_model,
            logging: raw.logging,
        })
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            image_extensions: ["png", "jpg", "jpeg"].map(String::from).to_vec(),
            video_extensions: ["mp4", "mov", "avi", "mkv"].map(String::from).to_vec(),
            max_image_width: 1280,
            max_image_height: 720,
            max_video_size: 456,
            frame_count_options: DEFAULT_FRAME_COUNT_OPTIONS.to_vec(),
        }
    }
}

impl MediaSettings {
    #[must_use]
    pub fn is_image_file(&self, file: &Path) -> bool {
        lowercase_extension(file).is_some_and(|ext| self.image_extensions.contains(&ext))
    }

    #[must_use]
    pub fn is_video_file(&self, file: &Path) -> bool {
        lowercase_extension(file).is_some_and(|ext| self.video_extensions.contains(&ext))
    }

    /// Bounding box resized images have to fit in.
    #[must_use]
    pub const fn max_resolution(&self) -> (u32, u32) {
        (self.max_image_width, self.max_image_height)
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub captioning: RawCaptioningSettings,
    pub language_model: LanguageModelSettings,
    pub logging: LoggingSettings,
}

/// What to caption and how, before paths are made absolute.
#[derive(Debug, Deserialize, Clone)]
pub struct RawCaptioningSettings {
    /// Folder containing the `img/` and `vid/` source folders.
    pub input_folder: PathBuf,
    pub process_images: bool,
    pub process_videos: bool,
    /// Replace captions that already exist on disk.
    pub overwrite_captions: bool,
    /// Stride, in source frames, between two sampled video frames.
    pub fps_divisor: u32,
    /// Requested number of frames per video. Stepped down through
    /// `media.frame_count_options` for short videos.
    pub max_frames: u32,
    pub media: MediaSettings,
}

/// Configuration for media normalization and frame sampling.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaSettings {
    /// Which extensions are categorized as images
    pub image_extensions: Vec<String>,
    /// Which extensions are categorized as videos
    pub video_extensions: Vec<String>,
    /// Resized images never exceed this width.
    pub max_image_width: u32,
    /// Resized images never exceed this height.
    pub max_image_height: u32,
    /// Length in pixels of the longer edge of a rescaled video.
    pub max_video_size: u32,
    /// Allowed numbers of frames to sample from one video.
    pub frame_count_options: Vec<u32>,
}

/// Connection and sampling parameters for the OpenAI-compatible endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct LanguageModelSettings {
    pub base_url: String,
    pub model: String,
    /// Cap on the number of generated tokens per caption.
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub presence_penalty: f32,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

#![deny(clippy::unwrap_used)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

//! # Media preparation for captioning
//!
//! Normalizes images and videos before they are shown to a vision-language model,
//! and samples a fixed number of frames from each video.
//!
//! - **Images** are shrunk to fit a bounding box with a Lanczos3 filter
//!   (see [`resize_image`]).
//! - **Videos** are re-encoded by `FFmpeg` so their longer edge has a fixed size
//!   (see [`rescale_video`]), which bounds the cost of decoding them afterwards.
//! - **Frames** are picked by a [`FrameSamplingPlan`]: evenly spaced, centered in
//!   the video, and as many as one of a few allowed counts (see [`extract_frames`]).
//!
//! All operations skip work whose output already exists, except frame extraction,
//! which always starts from an empty frames folder.

mod ffmpeg;
mod frame_sampler;
mod photo;
mod utils;
mod video;

pub use ffmpeg::{FfmpegCommand, VideoInfo, probe_video};
pub use frame_sampler::{
    FRAME_EXTENSION, FrameSamplingPlan, MAX_FRAME_COUNT, frame_file_name, frame_file_pattern, list_frames,
    select_frame_count,
};
pub use photo::{fit_within, resize_image};
pub use video::{extract_frames, rescale_video, rescaled_dimensions};

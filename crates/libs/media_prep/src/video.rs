use crate::ffmpeg::{FfmpegCommand, probe_video};
use crate::frame_sampler::{FrameSamplingPlan, frame_file_pattern, list_frames};
use crate::utils;
use color_eyre::eyre::{Context, Result, bail, eyre};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Re-encodes a video so its longer edge is `max_size` pixels.
///
/// `max_size` must be even, since the encoder needs even dimensions and the shorter
/// edge is rounded up to the next even number. Skipped if `output` already exists.
/// The new file is written next to `output` and renamed into place once `ffmpeg`
/// finishes.
pub async fn rescale_video(input: &Path, output: &Path, max_size: u32) -> Result<PathBuf> {
    if max_size == 0 || max_size % 2 != 0 {
        bail!("video size must be a positive even number, got {max_size}");
    }
    if output.exists() {
        return Ok(output.to_path_buf());
    }

    let info = probe_video(input).await?;
    let (new_w, new_h) = rescaled_dimensions(info.width, info.height, max_size);
    debug!(
        "Rescaling {} from {}x{} to {new_w}x{new_h}",
        input.display(),
        info.width,
        info.height
    );

    let file_name = output
        .file_name()
        .ok_or_else(|| eyre!("{} has no file name", output.display()))?;
    let temp_dir = utils::temp_dir_beside(output)?;
    let temp_output = temp_dir.path().join(file_name);

    let mut cmd = FfmpegCommand::new(input);
    let scaled = cmd.add_scale(
        "[0:v:0]",
        i32::try_from(new_w)?,
        i32::try_from(new_h)?,
    );
    cmd.map_video_output(&scaled, &temp_output);
    cmd.run()
        .await
        .wrap_err_with(|| format!("cannot rescale {}", input.display()))?;

    fs::rename(&temp_output, output).await?;
    temp_dir.close()?;
    Ok(output.to_path_buf())
}

/// Size with the longer edge at `max_size` and the shorter edge scaled proportionally
/// (truncated). Videos smaller than `max_size` are scaled up.
#[must_use]
pub fn rescaled_dimensions(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let scale = |dim: u32, longer: u32| {
        let scaled = u64::from(dim) * u64::from(max_size) / u64::from(longer.max(1));
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    };
    if width > height {
        (max_size, scale(height, width))
    } else {
        (scale(width, height), max_size)
    }
}

/// Samples frames from `video` into `frames_folder` as `frame_NNN.jpg`.
///
/// Frames from an earlier extraction are removed first. Returns the extracted frame
/// paths in temporal order, which can be fewer than planned when the video is short.
pub async fn extract_frames(
    video: &Path,
    frames_folder: &Path,
    fps_divisor: u32,
    max_frames: u32,
    frame_count_options: &[u32],
) -> Result<Vec<PathBuf>> {
    let info = probe_video(video).await?;
    let plan = FrameSamplingPlan::new(
        info.frame_count,
        fps_divisor,
        max_frames,
        frame_count_options,
    )?;
    debug!("Sampling plan for {}: {plan:?}", video.display());
    if plan.frame_count > plan.possible_frames() {
        warn!(
            "{} has room for {} frames at interval {}, requesting {}",
            video.display(),
            plan.possible_frames(),
            plan.frame_interval,
            plan.frame_count
        );
    }

    if frames_folder.exists() {
        fs::remove_dir_all(frames_folder).await?;
    }
    fs::create_dir_all(frames_folder).await?;

    let mut cmd = FfmpegCommand::new(video);
    let selected = cmd.add_select("[0:v:0]", &plan.select_expression());
    cmd.map_image_sequence_output(
        &selected,
        plan.frame_count,
        frames_folder,
        &frame_file_pattern(),
    );
    cmd.run()
        .await
        .wrap_err_with(|| format!("cannot extract frames from {}", video.display()))?;

    list_frames(frames_folder)
}

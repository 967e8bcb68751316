mod common;

use auto_caption::{CaptionSummary, auto_caption};
use color_eyre::Result;
use common::{RecordingModel, ffmpeg_available, file_names, write_test_clip};
use media_prep::{frame_file_name, probe_video};
use std::fs;

macro_rules! require_ffmpeg {
    () => {
        if !ffmpeg_available().await {
            eprintln!("ffmpeg not found, skipping");
            return Ok(());
        }
    };
}

/// Creates `<root>/vid/<name>` with a test clip of `frames` frames.
async fn video_tree(name: &str, frames: u32) -> Result<tempfile::TempDir> {
    let root = tempfile::tempdir()?;
    let vid = root.path().join("vid");
    fs::create_dir_all(&vid)?;
    write_test_clip(&vid.join(name), frames).await?;
    Ok(root)
}

fn expected_frames(count: u64) -> Vec<String> {
    (0..count).map(frame_file_name).collect()
}

#[tokio::test]
async fn long_video_is_sampled_into_requested_frames() -> Result<()> {
    require_ffmpeg!();
    let root = video_tree("long.mp4", 1000).await?;
    let model = RecordingModel::default();

    let summary = auto_caption(&model, root.path())
        .process_images(false)
        .call()
        .await?;

    assert_eq!(
        summary,
        CaptionSummary {
            videos_captioned: 1,
            ..CaptionSummary::default()
        }
    );
    let out = root.path().join("input/videos");
    let rescaled = probe_video(&out.join("long.mp4")).await?;
    assert_eq!((rescaled.width, rescaled.height), (456, 342));
    assert_eq!(rescaled.frame_count, 1000);

    assert_eq!(file_names(&out.join("long_frames"))?, expected_frames(49));
    let requests = model.requests();
    assert_eq!(requests.len(), 1);
    let sent: Vec<_> = requests[0]
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(String::from))
        .collect();
    assert_eq!(sent, expected_frames(49));
    assert_eq!(
        fs::read_to_string(out.join("long.txt"))?,
        "A picture called frame_000.jpg."
    );
    Ok(())
}

#[tokio::test]
async fn short_video_keeps_every_available_frame() -> Result<()> {
    require_ffmpeg!();
    let root = video_tree("short.mov", 200).await?;
    let model = RecordingModel::default();

    auto_caption(&model, root.path())
        .process_images(false)
        .max_frames(81)
        .call()
        .await?;

    // 200 frames at a stride of 16 leave 13 frames: 0, 16, ..., 192.
    let frames = root.path().join("input/videos/short_frames");
    assert_eq!(file_names(&frames)?, expected_frames(13));
    assert_eq!(model.requests().first().map(Vec::len), Some(13));
    Ok(())
}

#[tokio::test]
async fn existing_video_caption_is_kept_without_overwrite() -> Result<()> {
    require_ffmpeg!();
    let root = video_tree("clip.mp4", 300).await?;
    let caption = root.path().join("input/videos/clip.txt");
    let model = RecordingModel::default();

    auto_caption(&model, root.path())
        .process_images(false)
        .call()
        .await?;
    assert_eq!(model.calls(), 1);
    fs::write(&caption, "hand written caption")?;

    let summary = auto_caption(&model, root.path())
        .process_images(false)
        .overwrite_captions(false)
        .call()
        .await?;

    assert_eq!(model.calls(), 1);
    assert_eq!(summary.videos_skipped, 1);
    assert_eq!(summary.videos_captioned, 0);
    assert_eq!(fs::read(&caption)?, b"hand written caption");

    auto_caption(&model, root.path())
        .process_images(false)
        .call()
        .await?;
    assert_eq!(model.calls(), 2);
    assert_eq!(
        fs::read_to_string(&caption)?,
        "A picture called frame_000.jpg."
    );
    Ok(())
}

#[tokio::test]
async fn rerun_leaves_no_stale_frames() -> Result<()> {
    require_ffmpeg!();
    let root = video_tree("long.mkv", 1000).await?;
    let frames = root.path().join("input/videos/long_frames");
    let model = RecordingModel::default();

    auto_caption(&model, root.path())
        .process_images(false)
        .max_frames(57)
        .call()
        .await?;
    assert_eq!(file_names(&frames)?, expected_frames(57));

    auto_caption(&model, root.path())
        .process_images(false)
        .max_frames(49)
        .call()
        .await?;
    assert_eq!(file_names(&frames)?, expected_frames(49));
    assert_eq!(model.requests().last().map(Vec::len), Some(49));
    Ok(())
}

use crate::media_item::{CaptionLayout, MediaItem, MediaKind, discover_media};
use app_state::MediaSettings;
use bon::builder;
use captioner::{CaptionModel, generate_caption};
use color_eyre::eyre::{Result, bail, eyre};
use media_prep::{extract_frames, rescale_video, resize_image};
use std::fmt;
use std::path::{Path, PathBuf};
use std::slice;
use std::time::Instant;
use tokio::fs;
use tracing::info;

/// What happened during one [`auto_caption`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptionSummary {
    pub images_captioned: usize,
    pub images_skipped: usize,
    pub videos_captioned: usize,
    pub videos_skipped: usize,
}

impl CaptionSummary {
    fn record(&mut self, kind: MediaKind, captioned: bool) {
        let counter = match (kind, captioned) {
            (MediaKind::Image, true) => &mut self.images_captioned,
            (MediaKind::Image, false) => &mut self.images_skipped,
            (MediaKind::Video, true) => &mut self.videos_captioned,
            (MediaKind::Video, false) => &mut self.videos_skipped,
        };
        *counter += 1;
    }
}

impl fmt::Display for CaptionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "images: {} captioned, {} skipped; videos: {} captioned, {} skipped",
            self.images_captioned, self.images_skipped, self.videos_captioned, self.videos_skipped
        )
    }
}

/// Captions every image in `<input_folder>/img` and every video in `<input_folder>/vid`.
///
/// Items are handled one at a time, in file name order. Images are resized and
/// videos rescaled and sampled into `<input_folder>/input`, then each gets a `.txt`
/// caption next to its normalized copy. Normalized media is reused when it exists;
/// captions are only replaced when `overwrite_captions` is set.
///
/// # Errors
///
/// Fails on the first item that cannot be read, converted or captioned.
#[builder]
pub async fn auto_caption<M: CaptionModel>(
    #[builder(start_fn)] model: &M,
    #[builder(start_fn)] input_folder: &Path,
    #[builder(default = true)] process_images: bool,
    #[builder(default = true)] process_videos: bool,
    #[builder(default = true)] overwrite_captions: bool,
    #[builder(default = 16)] fps_divisor: u32,
    #[builder(default = 49)] max_frames: u32,
    #[builder(default)] media: MediaSettings,
) -> Result<CaptionSummary> {
    let layout = CaptionLayout::new(input_folder);
    fs::create_dir_all(&layout.image_outputs).await?;
    fs::create_dir_all(&layout.video_outputs).await?;

    let now = Instant::now();
    let mut summary = CaptionSummary::default();

    if process_images {
        let sources = discover_media(&layout.image_sources, |p| media.is_image_file(p))?;
        info!("Found {} images in {}", sources.len(), layout.image_sources.display());
        for source in sources {
            let item = MediaItem::new(MediaKind::Image, &source, &layout.image_outputs)?;
            resize_image(&item.source, &item.output, media.max_resolution())?;
            let captioned = write_caption(
                model,
                &item,
                slice::from_ref(&item.output),
                overwrite_captions,
            )
            .await?;
            summary.record(item.kind, captioned);
        }
    }

    if process_videos {
        let sources = discover_media(&layout.video_sources, |p| media.is_video_file(p))?;
        info!("Found {} videos in {}", sources.len(), layout.video_sources.display());
        for source in sources {
            let item = MediaItem::new(MediaKind::Video, &source, &layout.video_outputs)?;
            let frames_folder = item
                .frames_folder
                .as_deref()
                .ok_or_else(|| eyre!("{} has no frames folder", item.source.display()))?;
            rescale_video(&item.source, &item.output, media.max_video_size).await?;
            let frames = extract_frames(
                &item.output,
                frames_folder,
                fps_divisor,
                max_frames,
                &media.frame_count_options,
            )
            .await?;
            info!("Extracted {} frames from {}", frames.len(), item.output.display());
            let captioned = write_caption(model, &item, &frames, overwrite_captions).await?;
            summary.record(item.kind, captioned);
        }
    }

    info!("Captioning done in {:?}: {summary}", now.elapsed());
    Ok(summary)
}

/// Writes the caption for `item`, unless one exists and may not be overwritten.
/// Returns whether the model was asked for a caption.
async fn write_caption<M: CaptionModel>(
    model: &M,
    item: &MediaItem,
    images: &[PathBuf],
    overwrite_captions: bool,
) -> Result<bool> {
    if !overwrite_captions && item.caption_path.exists() {
        info!("Caption exists, skipping {}", item.source.display());
        return Ok(false);
    }
    if images.is_empty() {
        bail!("no images to caption for {}", item.source.display());
    }

    let caption = generate_caption(model, images).await?;
    fs::write(&item.caption_path, &caption).await?;
    info!("Captioned {}: {caption}", item.source.display());
    Ok(true)
}

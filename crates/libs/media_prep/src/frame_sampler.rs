use color_eyre::eyre::{Result, bail};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of extracted frame files.
pub const FRAME_EXTENSION: &str = "jpg";

/// Most frames one video may be sampled into. Frame names carry a three digit index.
pub const MAX_FRAME_COUNT: u32 = 999;

/// Which frames to pull from a video, and at what stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSamplingPlan {
    pub total_frames: u64,
    /// Stride in source frames between two samples.
    pub frame_interval: u64,
    /// Number of frames to extract. May exceed what the video holds, see [`select_frame_count`].
    pub frame_count: u64,
    /// First sampled frame, chosen so the sampled span is centered in the video.
    pub start_frame: u64,
}

impl FrameSamplingPlan {
    /// Plans sampling for a video of `total_frames` frames.
    ///
    /// `options` must be sorted ascending. `max_frames` must lie in `1..=`[`MAX_FRAME_COUNT`].
    pub fn new(
        total_frames: u64,
        frame_interval: u32,
        max_frames: u32,
        options: &[u32],
    ) -> Result<Self> {
        if frame_interval == 0 {
            bail!("frame interval must be at least 1");
        }
        if !(1..=MAX_FRAME_COUNT).contains(&max_frames) {
            bail!("max frames must be between 1 and {MAX_FRAME_COUNT}, got {max_frames}");
        }
        let frame_interval = u64::from(frame_interval);
        let possible_frames = total_frames / frame_interval;
        let frame_count = u64::from(select_frame_count(possible_frames, max_frames, options));
        let start_frame = total_frames.saturating_sub(frame_count * frame_interval) / 2;

        Ok(Self {
            total_frames,
            frame_interval,
            frame_count,
            start_frame,
        })
    }

    /// Number of evenly spaced samples the video can provide at this stride.
    #[must_use]
    pub const fn possible_frames(&self) -> u64 {
        self.total_frames / self.frame_interval
    }

    /// Index of the last frame the plan would extract, if the video were long enough.
    #[must_use]
    pub const fn last_frame(&self) -> u64 {
        self.start_frame + self.frame_count.saturating_sub(1) * self.frame_interval
    }

    /// Whether frame `index` is extracted, in decode order.
    #[must_use]
    pub const fn selects(&self, index: u64) -> bool {
        self.frame_count > 0
            && index >= self.start_frame
            && index <= self.last_frame()
            && (index - self.start_frame) % self.frame_interval == 0
    }

    /// Source frame indices that will be extracted, limited to frames that exist.
    pub fn frame_indices(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.total_frames).filter(|&i| self.selects(i))
    }

    /// `ffmpeg` `select` filter expression matching [`Self::selects`], with commas
    /// escaped for use inside a filter graph.
    #[must_use]
    pub fn select_expression(&self) -> String {
        let start = self.start_frame;
        format!(
            "between(n\\,{start}\\,{})*not(mod(n-{start}\\,{}))",
            self.last_frame(),
            self.frame_interval
        )
    }
}

/// Picks how many frames to sample given how many the video can provide.
///
/// A request that fits is kept as is. Otherwise the count steps down to the largest
/// option below the request that fits. When no option fits, the count floors at the
/// smallest option (or the request, if that is smaller), which can still be more
/// frames than the video holds.
#[must_use]
pub fn select_frame_count(possible_frames: u64, max_frames: u32, options: &[u32]) -> u32 {
    if u64::from(max_frames) <= possible_frames {
        return max_frames;
    }
    options
        .iter()
        .rev()
        .copied()
        .filter(|&option| option < max_frames)
        .find(|&option| u64::from(option) <= possible_frames)
        .unwrap_or_else(|| options.first().map_or(max_frames, |&min| min.min(max_frames)))
}

/// File name of the `index`-th extracted frame. Zero padded so name order is temporal order.
#[must_use]
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index:03}.{FRAME_EXTENSION}")
}

/// `ffmpeg` output pattern producing [`frame_file_name`] names.
#[must_use]
pub fn frame_file_pattern() -> String {
    format!("frame_%03d.{FRAME_EXTENSION}")
}

/// Extracted frames in `folder`, in temporal order.
pub fn list_frames(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = vec![];
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        let is_frame = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION));
        if entry.file_type().is_file() && is_frame {
            frames.push(path.to_path_buf());
        }
    }
    Ok(frames)
}

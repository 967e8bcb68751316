use crate::utils;
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde::Deserialize;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A builder for creating and running `FFmpeg` commands with a filter graph.
pub struct FfmpegCommand {
    input: PathBuf,
    filters: Vec<String>,
    maps: Vec<OsString>,
}

impl FfmpegCommand {
    /// Creates a new `FFmpeg` command reading from a single input file.
    pub fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            filters: Vec::new(),
            maps: Vec::new(),
        }
    }

    /// Adds a `scale` filter to resize a video stream.
    /// Returns the output stream label (e.g., `[out_0]`).
    ///
    /// Automatically ensures dimensions are even numbers.
    pub fn add_scale(&mut self, input_stream: &str, width: i32, height: i32) -> String {
        // Helper to ensure dimensions are even (required for YUV420)
        let sanitize = |val: i32| {
            if val == -1 {
                -2
            }
            // Round odd up to even
            else if val > 0 && val % 2 != 0 {
                val + 1
            } else {
                val
            }
        };

        let w = sanitize(width);
        let h = sanitize(height);

        let out_label = format!("[out_{}]", self.filters.len());
        self.filters
            .push(format!("{input_stream}scale={w}:{h}{out_label}"));
        out_label
    }

    /// Adds a `select` filter keeping only frames for which `expression` is non-zero.
    /// Commas in `expression` must already be escaped for the filter graph.
    pub fn add_select(&mut self, input_stream: &str, expression: &str) -> String {
        let out_label = format!("[sel_{}]", self.filters.len());
        self.filters
            .push(format!("{input_stream}select={expression}{out_label}"));
        out_label
    }

    /// Maps a filtered stream to a video-only output file, encoded with the
    /// default codec for the output container.
    pub fn map_video_output(&mut self, video_stream: &str, out_path: &Path) {
        self.maps.extend([
            "-map".into(),
            video_stream.into(),
            utils::path_to_os_string(out_path),
        ]);
    }

    /// Maps a filtered stream to a numbered sequence of still images, at most `max_frames`.
    /// `pattern` is a printf-style file name such as `frame_%03d.jpg`, numbered from 0.
    pub fn map_image_sequence_output(
        &mut self,
        stream_label: &str,
        max_frames: u64,
        out_folder: &Path,
        pattern: &str,
    ) {
        self.maps.extend([
            "-map".into(),
            stream_label.into(),
            "-fps_mode".into(),
            "vfr".into(),
            "-frames:v".into(),
            max_frames.to_string().into(),
            "-q:v".into(),
            "2".into(),
            "-start_number".into(),
            "0".into(),
            utils::path_to_os_string(&out_folder.join(pattern)),
        ]);
    }

    /// Full argument list passed to `ffmpeg`.
    #[must_use]
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            utils::path_to_os_string(&self.input),
        ];

        if !self.filters.is_empty() {
            args.push("-filter_complex".into());
            args.push(self.filters.join(";").into());
        }

        args.extend(self.maps.iter().cloned());
        args
    }

    /// Builds and runs the `FFmpeg` command.
    pub async fn run(self) -> Result<()> {
        if self.maps.is_empty() {
            return Ok(()); // Nothing to do
        }
        let args = self.args();
        debug!("ffmpeg {:?}", args);
        run_ffmpeg(&args).await
    }
}

async fn run_ffmpeg<S: AsRef<OsStr> + Send + Sync>(args: &[S]) -> Result<()> {
    let output = Command::new("ffmpeg")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("failed to run ffmpeg")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffmpeg failed: {}", stderr.trim());
    }
    Ok(())
}

#[derive(Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

#[derive(Deserialize)]
struct StreamInfo {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

/// Dimensions and length of the first video stream of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
}

/// Probes the first video stream of a file using ffprobe.
///
/// The frame count comes from counting packets, which is exact for the
/// re-encoded videos this crate produces, falling back to the container's
/// frame count.
pub async fn probe_video(video_path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args(ffprobe_args(video_path))
        .output()
        .await
        .context("failed to run ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "ffprobe failed on {}: {}",
            video_path.display(),
            stderr.trim()
        );
    }

    parse_probe_output(&output.stdout)
        .wrap_err_with(|| format!("cannot probe {}", video_path.display()))
}

/// Errors still reach stderr, everything else is silenced.
fn ffprobe_args(video_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-print_format",
        "json",
        "-select_streams",
        "v:0",
        "-count_packets",
        "-show_entries",
        "stream=width,height,nb_frames,nb_read_packets",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(utils::path_to_os_string(video_path));
    args
}

fn parse_probe_output(stdout: &[u8]) -> Result<VideoInfo> {
    let ffprobe_data: FfprobeOutput =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe JSON output")?;
    let stream = ffprobe_data
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| eyre!("no video stream found"))?;

    let (Some(width), Some(height)) = (stream.width, stream.height) else {
        bail!("video stream has no dimensions");
    };
    let frame_count = [stream.nb_read_packets, stream.nb_frames]
        .into_iter()
        .flatten()
        .find_map(|count| count.parse::<u64>().ok())
        .ok_or_else(|| eyre!("video stream has no frame count"))?;

    Ok(VideoInfo {
        width,
        height,
        frame_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(cmd: &FfmpegCommand) -> Vec<String> {
        cmd.args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn scale_rounds_odd_dimensions_up() {
        let mut cmd = FfmpegCommand::new(Path::new("in.mp4"));
        let label = cmd.add_scale("[0:v]", 456, 255);
        cmd.map_video_output(&label, Path::new("out.mp4"));

        assert_eq!(
            args_as_strings(&cmd),
            [
                "-y",
                "-i",
                "in.mp4",
                "-filter_complex",
                "[0:v]scale=456:256[out_0]",
                "-map",
                "[out_0]",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn image_sequence_output_is_bounded_and_zero_based() {
        let mut cmd = FfmpegCommand::new(Path::new("in.mp4"));
        let label = cmd.add_select("[0:v]", "not(mod(n\\,16))");
        cmd.map_image_sequence_output(&label, 49, Path::new("frames"), "frame_%03d.jpg");

        let args = args_as_strings(&cmd);
        assert_eq!(args[4], "[0:v]select=not(mod(n\\,16))[sel_0]");
        let frames_pos = args.iter().position(|a| a == "-frames:v");
        assert_eq!(frames_pos.map(|i| args[i + 1].as_str()), Some("49"));
        let start_pos = args.iter().position(|a| a == "-start_number");
        assert_eq!(start_pos.map(|i| args[i + 1].as_str()), Some("0"));
        assert_eq!(
            args.last().map(String::as_str),
            Some(Path::new("frames").join("frame_%03d.jpg").to_str().unwrap_or_default())
        );
    }

    #[test]
    fn ffprobe_reports_errors() {
        let args: Vec<String> = ffprobe_args(Path::new("clip.mp4"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let level = args.iter().position(|a| a == "-v");
        assert_eq!(level.map(|i| args[i + 1].as_str()), Some("error"));
        assert_eq!(args.last().map(String::as_str), Some("clip.mp4"));
    }

    #[tokio::test]
    async fn broken_video_error_carries_ffprobe_message() -> Result<()> {
        if std::process::Command::new("ffprobe")
            .arg("-version")
            .output()
            .is_err()
        {
            eprintln!("ffprobe not found, skipping");
            return Ok(());
        }
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.mp4");
        tokio::fs::write(&path, b"this is not a video").await?;

        let err = probe_video(&path).await.expect_err("garbage must not probe");
        let message = err.to_string();
        let detail = message
            .split_once(": ")
            .map_or("", |(_, detail)| detail.trim());
        assert!(!detail.is_empty(), "no ffprobe detail in {message:?}");
        Ok(())
    }

    #[test]
    fn parses_counted_packets() -> Result<()> {
        let json = br#"{"programs": [], "streams": [{"width": 456, "height": 256, "nb_frames": "998", "nb_read_packets": "1000"}]}"#;
        let info = parse_probe_output(json)?;
        assert_eq!(
            info,
            VideoInfo {
                width: 456,
                height: 256,
                frame_count: 1000
            }
        );
        Ok(())
    }

    #[test]
    fn falls_back_to_container_frame_count() -> Result<()> {
        let json = br#"{"streams": [{"width": 640, "height": 480, "nb_frames": "300"}]}"#;
        assert_eq!(parse_probe_output(json)?.frame_count, 300);
        Ok(())
    }

    #[test]
    fn missing_video_stream_is_an_error() {
        assert!(parse_probe_output(br#"{"streams": []}"#).is_err());
        assert!(parse_probe_output(br#"{}"#).is_err());
    }
}

use app_state::{AppSettings, load_app_settings};
use auto_caption::auto_caption;
use clap::Parser;
use color_eyre::Result;
use language_model::LlamaClient;
use media_prep::MAX_FRAME_COUNT;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Caption the images and videos of a folder with a vision-language model.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder containing `img/` and `vid/`. Defaults to `captioning.input_folder`.
    input_folder: Option<PathBuf>,

    /// Settings file.
    #[clap(long, default_value = "config/settings.yaml")]
    config: PathBuf,

    /// Caption the images in `img/`.
    #[clap(long, overrides_with = "no_images")]
    images: bool,

    /// Skip the images in `img/`.
    #[clap(long, overrides_with = "images")]
    no_images: bool,

    /// Caption the videos in `vid/`.
    #[clap(long, overrides_with = "no_videos")]
    videos: bool,

    /// Skip the videos in `vid/`.
    #[clap(long, overrides_with = "videos")]
    no_videos: bool,

    /// Regenerate captions that already exist.
    #[clap(long, overrides_with = "keep_captions")]
    overwrite_captions: bool,

    /// Keep captions that already exist instead of regenerating them.
    #[clap(long, overrides_with = "overwrite_captions")]
    keep_captions: bool,

    /// Stride in frames between two sampled video frames.
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    fps_divisor: Option<u32>,

    /// Number of frames to sample per video.
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FRAME_COUNT)))]
    max_frames: Option<u32>,

    /// Base URL of the OpenAI-compatible model server.
    #[clap(long)]
    base_url: Option<String>,
}

impl Args {
    /// Command line flags take precedence over the settings file.
    fn apply_to(self, settings: &mut AppSettings) {
        let captioning = &mut settings.captioning;
        if let Some(input_folder) = self.input_folder {
            captioning.input_folder = input_folder;
        }
        if let Some(on) = switch(self.images, self.no_images) {
            captioning.process_images = on;
        }
        if let Some(on) = switch(self.videos, self.no_videos) {
            captioning.process_videos = on;
        }
        if let Some(on) = switch(self.overwrite_captions, self.keep_captions) {
            captioning.overwrite_captions = on;
        }
        if let Some(fps_divisor) = self.fps_divisor {
            captioning.fps_divisor = fps_divisor;
        }
        if let Some(max_frames) = self.max_frames {
            captioning.max_frames = max_frames;
        }
        if let Some(base_url) = self.base_url {
            settings.language_model.base_url = base_url;
        }
    }
}

/// Value of an on/off flag pair, `None` when neither was given.
const fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let mut settings = load_app_settings(&args.config)?;
    args.apply_to(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let llm = &settings.language_model;
    let client = LlamaClient::with_base_url(&llm.base_url)
        .model(llm.model.clone())
        .max_tokens(llm.max_tokens)
        .temperature(llm.temperature)
        .top_p(llm.top_p)
        .repetition_penalty(llm.repetition_penalty)
        .presence_penalty(llm.presence_penalty)
        .build()?;
    info!("Captioning with '{}' at {}", llm.model, llm.base_url);

    let captioning = settings.captioning;
    let summary = auto_caption(&client, &captioning.input_folder)
        .process_images(captioning.process_images)
        .process_videos(captioning.process_videos)
        .overwrite_captions(captioning.overwrite_captions)
        .fps_divisor(captioning.fps_divisor)
        .max_frames(captioning.max_frames)
        .media(captioning.media)
        .call()
        .await?;
    info!("{summary}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::{
        CaptioningSettings, LanguageModelSettings, LoggingSettings, MediaSettings,
    };

    fn settings() -> AppSettings {
        AppSettings {
            captioning: CaptioningSettings {
                input_folder: PathBuf::from("/data/media"),
                process_images: true,
                process_videos: true,
                overwrite_captions: true,
                fps_divisor: 16,
                max_frames: 49,
                media: MediaSettings::default(),
            },
            language_model: LanguageModelSettings {
                base_url: "http://localhost:8080".to_string(),
                model: "deepseek-vl2-tiny".to_string(),
                max_tokens: 128,
                temperature: 0.7,
                top_p: 0.8,
                repetition_penalty: 1.0,
                presence_penalty: 1.5,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn flags_override_settings() {
        let args = Args::parse_from([
            "auto_caption",
            "/other",
            "--no-videos",
            "--keep-captions",
            "--fps-divisor",
            "8",
            "--base-url",
            "http://gpu:8080",
        ]);
        let mut settings = settings();
        args.apply_to(&mut settings);

        let captioning = &settings.captioning;
        assert_eq!(captioning.input_folder, PathBuf::from("/other"));
        assert!(captioning.process_images);
        assert!(!captioning.process_videos);
        assert!(!captioning.overwrite_captions);
        assert_eq!(captioning.fps_divisor, 8);
        assert_eq!(captioning.max_frames, 49);
        assert_eq!(settings.language_model.base_url, "http://gpu:8080");
    }

    #[test]
    fn no_flags_keep_settings() {
        let mut settings = settings();
        Args::parse_from(["auto_caption"]).apply_to(&mut settings);
        assert_eq!(settings.captioning.input_folder, PathBuf::from("/data/media"));
        assert!(settings.captioning.overwrite_captions);
        assert_eq!(settings.captioning.fps_divisor, 16);
    }

    #[test]
    fn flags_can_switch_settings_back_on() {
        let mut settings = settings();
        settings.captioning.process_images = false;
        settings.captioning.process_videos = false;
        settings.captioning.overwrite_captions = false;

        Args::parse_from(["auto_caption", "--images", "--videos", "--overwrite-captions"])
            .apply_to(&mut settings);

        assert!(settings.captioning.process_images);
        assert!(settings.captioning.process_videos);
        assert!(settings.captioning.overwrite_captions);
    }

    #[test]
    fn last_of_a_flag_pair_wins() {
        let mut settings = settings();
        Args::parse_from(["auto_caption", "--keep-captions", "--overwrite-captions"])
            .apply_to(&mut settings);
        assert!(settings.captioning.overwrite_captions);

        Args::parse_from(["auto_caption", "--overwrite-captions", "--keep-captions"])
            .apply_to(&mut settings);
        assert!(!settings.captioning.overwrite_captions);
    }

    #[test]
    fn max_frames_fits_frame_names() {
        assert!(Args::try_parse_from(["auto_caption", "--max-frames", "0"]).is_err());
        assert!(Args::try_parse_from(["auto_caption", "--max-frames", "1000"]).is_err());
        assert!(Args::try_parse_from(["auto_caption", "--max-frames", "999"]).is_ok());
    }

    #[test]
    fn zero_fps_divisor_is_rejected() {
        assert!(Args::try_parse_from(["auto_caption", "--fps-divisor", "0"]).is_err());
    }
}

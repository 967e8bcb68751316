use app_state::DEFAULT_FRAME_COUNT_OPTIONS;
use media_prep::{extract_frames, rescale_video};
use std::fs;
use std::path::Path;
use std::time::Instant;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let file = Path::new("media_dir/vid/jellyfish.mp4");
    let out_folder = Path::new("test_out");
    fs::create_dir_all(out_folder)?;

    let now = Instant::now();
    let rescaled = rescale_video(file, &out_folder.join("jellyfish.mp4"), 456).await?;
    let frames = extract_frames(
        &rescaled,
        &out_folder.join("jellyfish_frames"),
        16,
        49,
        &DEFAULT_FRAME_COUNT_OPTIONS,
    )
    .await?;
    println!("Extracted {} frames in {:?}", frames.len(), now.elapsed());

    Ok(())
}

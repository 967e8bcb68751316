use captioner::{CAPTION_MAX_TOKENS, generate_caption};
use language_model::LlamaClient;
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let llm_client = LlamaClient::with_base_url("http://localhost:8080")
        .max_tokens(CAPTION_MAX_TOKENS)
        .build()?;

    let single = [PathBuf::from("assets/island.png")];
    let now = Instant::now();
    println!("{}", generate_caption(&llm_client, &single).await?);
    println!("single image: {:?}", now.elapsed());

    let frames: Vec<PathBuf> = (0..4)
        .map(|i| PathBuf::from(format!("test_out/jellyfish_frames/frame_{i:03}.jpg")))
        .collect();
    let now = Instant::now();
    println!("{}", generate_caption(&llm_client, &frames).await?);
    println!("{} frames: {:?}", frames.len(), now.elapsed());

    Ok(())
}

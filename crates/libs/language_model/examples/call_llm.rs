use color_eyre::eyre::Result;
use language_model::{LlamaClient, Message, MessagePart};
use std::path::Path;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    color_eyre::install()?;

    let client = LlamaClient::with_base_url("http://localhost:8080")
        .max_tokens(128)
        .build()?;
    let img_island = Path::new("assets/island.png");
    let img_farm = Path::new("assets/farm.png");
    let prompt = "Caption this image in one paragraph. Respond with the caption only.";

    let now = Instant::now();
    let island = Message::user(vec![
        MessagePart::text(prompt),
        MessagePart::image(img_island).await?,
    ]);
    info!("Island: {}", client.call(vec![island]).await?);

    let both = Message::user(vec![
        MessagePart::text("What do these two images have in common?"),
        MessagePart::image(img_island).await?,
        MessagePart::image(img_farm).await?,
    ]);
    info!("Both: {}", client.call(vec![both]).await?);
    info!("Total time: {:?}", now.elapsed());

    Ok(())
}

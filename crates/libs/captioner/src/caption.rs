use async_trait::async_trait;
use color_eyre::eyre::{Context, Result, bail};
use language_model::{LlamaClient, Message, MessagePart};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Token budget for one caption.
pub const CAPTION_MAX_TOKENS: u32 = 128;

const CAPTION_INSTRUCTION: &str = "Describe these images briefly.";

/// Anything that can describe an ordered sequence of images.
#[async_trait]
pub trait CaptionModel: Send + Sync {
    async fn caption(&self, images: &[PathBuf]) -> Result<String>;
}

/// Builds one user turn that refers to each image by position (`image_1`, `image_2`, ...)
/// and asks for a brief description.
pub async fn build_caption_message(images: &[PathBuf]) -> Result<Message> {
    if images.is_empty() {
        bail!("cannot caption an empty image sequence");
    }
    let mut parts = Vec::with_capacity(images.len() * 2 + 1);
    for (idx, image) in images.iter().enumerate() {
        parts.push(MessagePart::text(format!("This is image_{}:", idx + 1)));
        parts.push(
            MessagePart::image(image)
                .await
                .wrap_err_with(|| format!("cannot attach {}", image.display()))?,
        );
    }
    parts.push(MessagePart::text(CAPTION_INSTRUCTION));
    Ok(Message::user(parts))
}

#[async_trait]
impl CaptionModel for LlamaClient {
    async fn caption(&self, images: &[PathBuf]) -> Result<String> {
        let message = build_caption_message(images).await?;
        Ok(self.call(vec![message]).await?)
    }
}

/// Captions one image, or the ordered frames of one video.
///
/// A blank caption is an error, so it never ends up on disk as if it were done.
pub async fn generate_caption<M: CaptionModel + ?Sized>(
    model: &M,
    images: &[PathBuf],
) -> Result<String> {
    let now = Instant::now();
    let caption = model.caption(images).await?;
    debug!("Captioned {} image(s) in {:?}", images.len(), now.elapsed());
    let caption = caption.trim();
    if caption.is_empty() {
        bail!("model returned a blank caption");
    }
    Ok(caption.to_string())
}

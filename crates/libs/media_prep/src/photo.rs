use color_eyre::eyre::{Context, Result, eyre};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resizes an image so it fits within `max_resolution` (width, height), keeping its
/// aspect ratio. Images that already fit are re-saved at their original size.
///
/// Returns `output` untouched if it already exists.
pub fn resize_image(input: &Path, output: &Path, max_resolution: (u32, u32)) -> Result<PathBuf> {
    if output.exists() {
        return Ok(output.to_path_buf());
    }

    let img = ImageReader::open(input)?
        .with_guessed_format()?
        .decode()
        .wrap_err_with(|| format!("cannot decode {}", input.display()))?;

    let (orig_w, orig_h) = img.dimensions();
    let (target_w, target_h) = fit_within(orig_w, orig_h, max_resolution);
    let resized = if (target_w, target_h) == (orig_w, orig_h) {
        img
    } else {
        debug!(
            "Resizing {} from {orig_w}x{orig_h} to {target_w}x{target_h}",
            input.display()
        );
        resize_lanczos(img, target_w, target_h)?
    };

    resized
        .save(output)
        .wrap_err_with(|| format!("cannot save {}", output.display()))?;
    Ok(output.to_path_buf())
}

/// Largest size with the aspect ratio of `width`x`height` that fits in `max_resolution`.
/// Never upscales.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_resolution: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = max_resolution;
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = (f64::from(max_w) / f64::from(width)).min(f64::from(max_h) / f64::from(height));
    let scaled = |dim: u32, max: u32| ((f64::from(dim) * scale).round() as u32).clamp(1, max.max(1));
    (scaled(width, max_w), scaled(height, max_h))
}

fn resize_lanczos(img: DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    let (orig_w, orig_h) = img.dimensions();
    let has_alpha = img.color().has_alpha();
    let (pixel_type, pixels) = if has_alpha {
        (PixelType::U8x4, img.into_rgba8().into_raw())
    } else {
        (PixelType::U8x3, img.into_rgb8().into_raw())
    };

    let src_image = Image::from_vec_u8(orig_w, orig_h, pixels, pixel_type)?;
    let mut dst_image = Image::new(width, height, pixel_type);
    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    Resizer::new().resize(&src_image, &mut dst_image, &options)?;

    let raw = dst_image.into_vec();
    let resized = if has_alpha {
        RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8)
    };
    resized.ok_or_else(|| eyre!("Failed to construct resized image"))
}

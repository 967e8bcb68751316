#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod batch;
mod media_item;

pub use batch::{CaptionSummary, auto_caption};
pub use media_item::{CaptionLayout, MediaItem, MediaKind, discover_media};

//! Resize -> sharpen -> protocol-encode render pipeline

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use image::imageops::FilterType;
use image::{GenericImageView, RgbaImage};
use tracing::debug;

use super::cache::{Cache, CacheKey};
use super::capabilities::Capabilities;
use super::encode;
use super::error::ImageError;
use super::hash::content_hash;
use super::protocol::Protocol;
use crate::config::RuntimeConfig;

/// Unsharp mask defaults per spec: amount ~0.3, radius 1.
const UNSHARP_AMOUNT: f32 = 0.3;
const UNSHARP_RADIUS: f32 = 1.0;

/// High-quality resize -> sharpen -> protocol-encode renderer, backed by an
/// LRU cache keyed on (protocol, target cells, content hash).
pub struct Renderer {
    capabilities: Capabilities,
    cache: Arc<Cache>,
    next_kitty_id: AtomicU32,
}

impl Renderer {
    pub fn new(capabilities: Capabilities, config: &RuntimeConfig) -> Self {
        Self {
            capabilities,
            cache: Arc::new(Cache::new(config.image.max_cache_size_mb as i64)),
            next_kitty_id: AtomicU32::new(1),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.capabilities.protocol
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Render an in-memory RGBA image to cells_w x cells_h terminal cells.
    pub fn render(&self, img: &RgbaImage, cells_w: u16, cells_h: u16) -> Result<String, ImageError> {
        let protocol = self.capabilities.protocol;
        if protocol == Protocol::None {
            return Err(ImageError::ProtocolDisabled);
        }

        let hash = content_hash(img);
        let key = CacheKey::new(protocol.name(), cells_w, cells_h, hash);

        if let Some(cached) = self.cache.get(&key) {
            debug!(protocol = protocol.name(), "render: cache hit");
            return Ok(cached);
        }

        let prepared = self.prepare(img, cells_w, cells_h);
        let encoded = self.encode_for_protocol(&prepared, protocol, cells_w, cells_h)?;

        self.cache.put(key, encoded.clone());
        Ok(encoded)
    }

    /// Decode an image from disk, then render it as [`Renderer::render`]
    /// would an in-memory image.
    pub fn render_file(&self, path: &Path, cells_w: u16, cells_h: u16) -> Result<String, ImageError> {
        let img = image::open(path)
            .map_err(|e| ImageError::DecodeError(format!("{}: {e}", path.display())))?
            .to_rgba8();
        self.render(&img, cells_w, cells_h)
    }

    /// Run the resize-to-fit + unsharp-mask pipeline without encoding,
    /// for callers (the placement compositor) that need prepared pixels
    /// rather than a finished escape sequence.
    pub(crate) fn prepare(&self, img: &RgbaImage, cells_w: u16, cells_h: u16) -> RgbaImage {
        let resized = self.resize_to_fit(img, cells_w, cells_h);
        unsharp_mask(&resized, UNSHARP_AMOUNT, UNSHARP_RADIUS)
    }

    fn resize_to_fit(&self, img: &RgbaImage, cells_w: u16, cells_h: u16) -> RgbaImage {
        let budget_w = cells_w as u32 * self.capabilities.cell_px_w as u32;
        let budget_h = cells_h as u32 * self.capabilities.cell_px_h as u32;
        let (width, height) = img.dimensions();

        if width <= budget_w && height <= budget_h {
            return img.clone();
        }

        let scale = (budget_w as f64 / width as f64).min(budget_h as f64 / height as f64);
        let new_w = ((width as f64 * scale).round() as u32).max(1);
        let new_h = ((height as f64 * scale).round() as u32).max(1);

        image::imageops::resize(img, new_w, new_h, FilterType::CatmullRom)
    }

    pub(crate) fn encode_for_protocol(
        &self,
        img: &RgbaImage,
        protocol: Protocol,
        cells_w: u16,
        cells_h: u16,
    ) -> Result<String, ImageError> {
        match protocol {
            Protocol::Halfblocks => Ok(encode::halfblocks::encode(img)),
            Protocol::Kitty => {
                let id = self.next_kitty_id.fetch_add(1, Ordering::Relaxed);
                Ok(encode::kitty::encode(img, id, cells_w, cells_h, 0))
            }
            Protocol::Iterm2 => encode::iterm2::encode(img, cells_w, cells_h).map_err(ImageError::RenderFailed),
            Protocol::Sixel => Ok(encode::sixel::encode(img)),
            Protocol::None => Err(ImageError::ProtocolDisabled),
        }
    }
}

/// Blend `amount` of (original - blurred) back into the original to restore
/// edge detail lost to downscaling. RGB channels only; alpha is preserved
/// untouched.
fn unsharp_mask(img: &RgbaImage, amount: f32, radius: f32) -> RgbaImage {
    let blurred = image::imageops::blur(img, radius);
    let mut out = img.clone();

    for (dst, (orig, blur)) in out.pixels_mut().zip(img.pixels().zip(blurred.pixels())) {
        for c in 0..3 {
            let o = orig.0[c] as f32;
            let b = blur.0[c] as f32;
            let sharpened = o + amount * (o - b);
            dst.0[c] = sharpened.clamp(0.0, 255.0) as u8;
        }
        dst.0[3] = orig.0[3];
    }

    out
}

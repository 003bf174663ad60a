//! iTerm2 inline-image protocol encoder (OSC 1337)

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{ImageEncoder, RgbaImage};

/// Encode an RGBA image as an iTerm2 inline image (OSC 1337 `File=`),
/// sized to `cells_w` x `cells_h` terminal cells.
pub fn encode(img: &RgbaImage, cells_w: u16, cells_h: u16) -> Result<String, String> {
    let mut png_bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_bytes)
        .write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgba8)
        .map_err(|e| format!("png encode failed: {e}"))?;

    let b64 = BASE64.encode(&png_bytes);
    Ok(format!(
        "\x1b]1337;File=inline=1;width={cells_w};height={cells_h};preserveAspectRatio=0:{b64}\x07"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_encode_shape() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        let out = encode(&img, 10, 5).unwrap();
        assert!(out.starts_with("\x1b]1337;File=inline=1;width=10;height=5;"));
        assert!(out.ends_with('\x07'));
    }
}

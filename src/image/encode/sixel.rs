//! DEC Sixel protocol encoder
//!
//! Quantizes to a 6-level-per-channel palette (216 colors, the familiar
//! xterm color-cube quantization) and emits one sixel band per 6 pixel
//! rows. Fully transparent pixels are simply never painted by any color
//! register, so the terminal's own background shows through them.

use image::RgbaImage;

const LEVELS: [u8; 6] = [0, 51, 102, 153, 204, 255];

fn quantize_channel(v: u8) -> u8 {
    *LEVELS
        .iter()
        .min_by_key(|lvl| (**lvl as i32 - v as i32).abs())
        .unwrap()
}

fn quantize(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    (quantize_channel(r), quantize_channel(g), quantize_channel(b))
}

fn register_index(r: u8, g: u8, b: u8) -> usize {
    let ri = LEVELS.iter().position(|l| *l == r).unwrap();
    let gi = LEVELS.iter().position(|l| *l == g).unwrap();
    let bi = LEVELS.iter().position(|l| *l == b).unwrap();
    ri * 36 + gi * 6 + bi
}

fn to_percent(channel: u8) -> u32 {
    (channel as u32 * 100 + 127) / 255
}

/// Encode an RGBA image as a DEC Sixel escape sequence.
pub fn encode(img: &RgbaImage) -> String {
    let (width, height) = img.dimensions();
    let mut out = String::new();
    out.push_str("\x1bPq");
    out.push_str(&format!("\"1;1;{width};{height}"));

    // Color register table, defined once up front.
    for (ri, r) in LEVELS.iter().enumerate() {
        for (gi, g) in LEVELS.iter().enumerate() {
            for (bi, b) in LEVELS.iter().enumerate() {
                let idx = ri * 36 + gi * 6 + bi;
                out.push_str(&format!(
                    "#{idx};2;{};{};{}",
                    to_percent(*r),
                    to_percent(*g),
                    to_percent(*b)
                ));
            }
        }
    }

    let mut y = 0u32;
    while y < height {
        let band_height = 6.min(height - y);

        // Which registers actually appear in this band, preserving first
        // appearance order (for stable, deterministic output).
        let mut used = Vec::new();
        for row in 0..band_height {
            for x in 0..width {
                let p = img.get_pixel(x, y + row);
                if p.0[3] == 0 {
                    continue;
                }
                let (r, g, b) = quantize(p.0[0], p.0[1], p.0[2]);
                let idx = register_index(r, g, b);
                if !used.contains(&idx) {
                    used.push(idx);
                }
            }
        }

        for idx in &used {
            out.push('#');
            out.push_str(&idx.to_string());
            for x in 0..width {
                let mut bits = 0u8;
                for row in 0..band_height {
                    let p = img.get_pixel(x, y + row);
                    if p.0[3] == 0 {
                        continue;
                    }
                    let (r, g, b) = quantize(p.0[0], p.0[1], p.0[2]);
                    if register_index(r, g, b) == *idx {
                        bits |= 1 << row;
                    }
                }
                out.push((63 + bits) as char);
            }
            out.push('$');
        }
        out.push('-');

        y += 6;
    }

    out.push_str("\x1b\\");
    out
}

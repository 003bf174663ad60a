//! Kitty graphics protocol encoder: APC transmit + display + placeholder grid

use std::io::Write;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;

/// Kitty chunks base64 payloads at this many bytes per APC message.
const CHUNK_SIZE: usize = 4096;
/// Placeholder glyph base codepoint.
const PLACEHOLDER_BASE: char = '\u{10EEEE}';
/// Base combining-diacritic codepoint; row/col indices offset from here.
const DIACRITIC_BASE: u32 = 0x0305;

fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("in-memory zlib write cannot fail");
    encoder.finish().expect("in-memory zlib finish cannot fail")
}

fn diacritic(index: u32) -> char {
    char::from_u32(DIACRITIC_BASE + index).unwrap_or('\u{0305}')
}

/// Build the transmit (`a=t`) APC sequence(s) for raw RGBA pixel data,
/// compressing with zlib when that reduces the payload size.
///
/// Per spec.md §4.5/§6 the transmit header is exactly `a=t,i=<id>,f=32[,o=z],m=<m>`
/// — the z-index belongs only to the display (`a=p`) command, not here.
pub(crate) fn transmit(id: u32, raw: &[u8]) -> String {
    let compressed = zlib_compress(raw);
    let (bytes, compressed_flag) = if compressed.len() < raw.len() {
        (compressed.as_slice(), true)
    } else {
        (raw, false)
    };

    let b64 = BASE64.encode(bytes);
    let chunks: Vec<&str> = if b64.is_empty() {
        vec![""]
    } else {
        b64.as_bytes()
            .chunks(CHUNK_SIZE)
            .map(|c| std::str::from_utf8(c).expect("base64 alphabet is ascii"))
            .collect()
    };

    let mut out = String::new();
    let last = chunks.len() - 1;
    for (i, chunk) in chunks.iter().enumerate() {
        let more = if i == last { 0 } else { 1 };
        if i == 0 {
            out.push_str("\x1b_Ga=t,i=");
            out.push_str(&id.to_string());
            out.push_str(",f=32");
            if compressed_flag {
                out.push_str(",o=z");
            }
            out.push_str(",m=");
            out.push_str(&more.to_string());
            out.push(';');
        } else {
            out.push_str("\x1b_Gm=");
            out.push_str(&more.to_string());
            out.push(';');
        }
        out.push_str(chunk);
        out.push_str("\x1b\\");
    }

    out
}

/// Build the display (`a=p`) APC sequence.
pub(crate) fn display(id: u32, rows: u16, cols: u16, z: i32) -> String {
    format!("\x1b_Ga=p,i={id},U=1,r={rows},c={cols},z={z};\x1b\\")
}

/// Build the Unicode placeholder grid that tells the terminal where a
/// previously-transmitted image should be composited.
pub(crate) fn placeholder_grid(rows: u16, cols: u16) -> String {
    let mut out = String::new();
    for row in 0..rows {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..cols {
            out.push(PLACEHOLDER_BASE);
            out.push(diacritic(row as u32));
            out.push(diacritic(col as u32));
        }
    }
    out
}

/// Encode an RGBA image for the kitty graphics protocol: transmit the raw
/// pixels under `id`, then emit the display command and placeholder grid
/// sized to `cells_w` x `cells_h`.
pub fn encode(img: &RgbaImage, id: u32, cells_w: u16, cells_h: u16, z: i32) -> String {
    let mut out = transmit(id, img.as_raw());
    out.push_str(&display(id, cells_h, cells_w, z));
    out.push_str(&placeholder_grid(cells_h, cells_w));
    out
}

//! Half-block protocol encoder: two pixel rows per terminal text row

use image::{Rgba, RgbaImage};

const UPPER_HALF_BLOCK: char = '\u{2580}';
const LOWER_HALF_BLOCK: char = '\u{2584}';
const RESET: &str = "\x1b[0m";

fn is_transparent(p: &Rgba<u8>) -> bool {
    p.0[3] == 0
}

fn push_fg(out: &mut String, p: &Rgba<u8>) {
    out.push_str(&format!("\x1b[38;2;{};{};{}m", p.0[0], p.0[1], p.0[2]));
}

fn push_bg(out: &mut String, p: &Rgba<u8>) {
    out.push_str(&format!("\x1b[48;2;{};{};{}m", p.0[0], p.0[1], p.0[2]));
}

/// Encode an RGBA image as a halfblocks escape sequence.
///
/// Each pair of pixel rows becomes one text row using U+2580 (upper half
/// block) with 24-bit foreground = top pixel, background = bottom pixel.
/// A fully transparent pair renders as a literal space; a top-only
/// transparent pair falls back to U+2584 with foreground = bottom pixel and
/// default background. An odd final row renders the upper half block alone
/// against the default background.
pub fn encode(img: &RgbaImage) -> String {
    let (width, height) = img.dimensions();
    let mut out = String::new();

    let mut y = 0u32;
    let mut first_row = true;
    while y < height {
        if !first_row {
            out.push('\n');
        }
        first_row = false;

        let has_bottom = y + 1 < height;
        for x in 0..width {
            let top = *img.get_pixel(x, y);
            let bottom = if has_bottom { Some(*img.get_pixel(x, y + 1)) } else { None };

            out.push_str(RESET);
            match bottom {
                None => {
                    if is_transparent(&top) {
                        out.push(' ');
                    } else {
                        push_fg(&mut out, &top);
                        out.push(UPPER_HALF_BLOCK);
                    }
                }
                Some(bottom) => {
                    let top_t = is_transparent(&top);
                    let bottom_t = is_transparent(&bottom);
                    if top_t && bottom_t {
                        out.push(' ');
                    } else if top_t {
                        push_fg(&mut out, &bottom);
                        out.push(LOWER_HALF_BLOCK);
                    } else if bottom_t {
                        push_fg(&mut out, &top);
                        out.push(UPPER_HALF_BLOCK);
                    } else {
                        push_fg(&mut out, &top);
                        push_bg(&mut out, &bottom);
                        out.push(UPPER_HALF_BLOCK);
                    }
                }
            }
        }

        y += 2;
    }

    out.push_str(RESET);
    out
}

/// Strip ANSI escape sequences, leaving only the printable content. Used by
/// tests to assert on the rendered glyph/space layout independent of the
/// exact SGR codes chosen.
#[cfg(test)]
pub(crate) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Consume CSI sequence: ESC [ ... letter
            if chars.peek() == Some(&'[') {
                chars.next();
                for c2 in chars.by_ref() {
                    if c2.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

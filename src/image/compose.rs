//! Multi-image placement compositing: one escape-sequence stream covering
//! several images positioned at independent cursor locations

use image::RgbaImage;

use super::encode::kitty;
use super::error::ImageError;
use super::protocol::Protocol;
use super::renderer::Renderer;

/// One image positioned at a fixed cell origin within the current viewport.
///
/// `id = 0` requests auto-assignment (positional index + 1, per spec.md
/// §4.9/§9); a caller that needs to address a placement independently of
/// its position in the list may supply an explicit non-zero id instead. The
/// spec reserves no namespace between the two, so a consumer mixing both
/// should pick explicit ids above whatever range auto-assignment could
/// reach.
#[derive(Clone)]
pub struct Placement {
    pub id: u32,
    pub img: RgbaImage,
    pub row: u16,
    pub col: u16,
    pub cols: u16,
    pub rows: u16,
    pub z: i32,
}

impl Placement {
    pub fn new(img: RgbaImage, row: u16, col: u16, cols: u16, rows: u16, z: i32) -> Self {
        Self {
            id: 0,
            img,
            row,
            col,
            cols,
            rows,
            z,
        }
    }

    /// As [`Placement::new`], with an explicit application-managed id
    /// instead of requesting auto-assignment.
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }
}

fn cursor_move(row: u16, col: u16) -> String {
    format!("\x1b[{};{}H", row + 1, col + 1)
}

/// Render a set of placements as a single escape-sequence stream.
///
/// Under the kitty protocol this runs two passes: every image is
/// transmitted first (each assigned a positional id starting at 1), then a
/// second pass moves the cursor and emits the display command and
/// placeholder grid for each placement in turn. Every other protocol is a
/// single pass of cursor-move followed by the protocol's own encoded
/// output.
pub fn render_placements(renderer: &Renderer, placements: &[Placement]) -> Result<String, ImageError> {
    let protocol = renderer.protocol();
    if protocol == Protocol::None {
        return Err(ImageError::ProtocolDisabled);
    }
    if placements.is_empty() {
        return Ok(String::new());
    }

    if protocol == Protocol::Kitty {
        return render_placements_kitty(renderer, placements);
    }

    let mut out = String::new();
    for placement in placements {
        let prepared = renderer.prepare(&placement.img, placement.cols, placement.rows);
        let encoded = renderer.encode_for_protocol(&prepared, protocol, placement.cols, placement.rows)?;
        out.push_str(&cursor_move(placement.row, placement.col));
        out.push_str(&encoded);
    }
    Ok(out)
}

fn render_placements_kitty(renderer: &Renderer, placements: &[Placement]) -> Result<String, ImageError> {
    // Pass 1: zero ids are assigned their positional index + 1; explicit
    // non-zero ids pass through untouched.
    let ids: Vec<u32> = placements
        .iter()
        .enumerate()
        .map(|(i, p)| if p.id == 0 { (i + 1) as u32 } else { p.id })
        .collect();

    let prepared: Vec<RgbaImage> = placements
        .iter()
        .map(|p| renderer.prepare(&p.img, p.cols, p.rows))
        .collect();

    let mut out = String::new();
    for (img, id) in prepared.iter().zip(ids.iter()) {
        out.push_str(&kitty::transmit(*id, img.as_raw()));
    }

    for (id, placement) in ids.iter().zip(placements.iter()) {
        if placement.row != 0 || placement.col != 0 {
            out.push_str(&cursor_move(placement.row, placement.col));
        }
        out.push_str(&kitty::display(*id, placement.rows, placement.cols, placement.z));
        out.push_str(&kitty::placeholder_grid(placement.rows, placement.cols));
    }

    Ok(out)
}

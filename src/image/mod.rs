//! Terminal image rendering engine
//!
//! Detects the hosting terminal's capabilities once at startup, then renders
//! RGBA images to one of several terminal graphics protocols (kitty,
//! iTerm2, sixel, halfblocks) behind a byte-budgeted LRU cache keyed on
//! content hash. [`AsyncRenderer`] fronts [`Renderer`] with a bounded worker
//! pool so callers never block on a render in progress; [`compose`] handles
//! multi-image viewports.

pub mod async_renderer;
pub mod cache;
pub mod capabilities;
pub mod compose;
pub mod encode;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod renderer;

pub use async_renderer::AsyncRenderer;
pub use cache::{Cache, CacheKey, CacheStats};
pub use capabilities::Capabilities;
pub use compose::{render_placements, Placement};
pub use error::ImageError;
pub use protocol::{Protocol, TerminalKind};
pub use renderer::Renderer;

//! dashprobe - collector orchestration runtime and terminal image rendering
//! engine for a prompt-augmentation dashboard
//!
//! # Modules
//!
//! - [`collector`] - polymorphic data sources, their registry, and the
//!   runner that drives them on independent schedules
//! - [`image`] - terminal capability detection and the resize/sharpen/encode
//!   pipeline covering kitty, iTerm2, sixel, and halfblocks
//! - [`config`] - runtime configuration types and loading

pub mod collector;
pub mod config;
pub mod image;

pub use collector::{Collector, CollectorError, CollectorStatus, Payload, Registry, Runner, Update};
pub use config::RuntimeConfig;
pub use image::{AsyncRenderer, Cache, Capabilities, ImageError, Placement, Protocol, Renderer, TerminalKind};

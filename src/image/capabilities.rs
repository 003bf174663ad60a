//! Terminal capability detection, snapshotted once per process

use std::collections::HashMap;

use super::protocol::{self, Protocol, TerminalKind};

/// Default cell size in pixels, per the glossary's "approximately 8x16".
const DEFAULT_CELL_PX_W: u16 = 8;
const DEFAULT_CELL_PX_H: u16 = 16;

/// A one-time snapshot of the hosting terminal's rendering capabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub terminal_kind: TerminalKind,
    pub protocol: Protocol,
    pub cell_cols: u16,
    pub cell_rows: u16,
    pub cell_px_w: u16,
    pub cell_px_h: u16,
    pub truecolor: bool,
    pub ssh: bool,
    pub multiplexer: bool,
}

impl Capabilities {
    /// Detect capabilities from the live process environment.
    pub fn detect(protocol_override: Option<&str>) -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_env(&env, protocol_override)
    }

    /// Detect capabilities from an explicit environment snapshot. Exposed
    /// separately from [`Capabilities::detect`] so tests never need to
    /// mutate the real process environment.
    pub fn from_env(env: &HashMap<String, String>, protocol_override: Option<&str>) -> Self {
        let terminal_kind = terminal_kind(env);
        let protocol = protocol::select(env, protocol_override);

        let cell_cols = env.get("COLUMNS").and_then(|v| v.parse().ok()).unwrap_or(80);
        let cell_rows = env.get("LINES").and_then(|v| v.parse().ok()).unwrap_or(24);

        let truecolor = env
            .get("COLORTERM")
            .map(|v| v == "truecolor" || v == "24bit")
            .unwrap_or(false);

        let ssh = env.contains_key("SSH_TTY") || env.contains_key("SSH_CONNECTION") || env.contains_key("SSH_CLIENT");
        let multiplexer = env.contains_key("TMUX") || env.contains_key("STY");

        Self {
            terminal_kind,
            protocol,
            cell_cols,
            cell_rows,
            cell_px_w: DEFAULT_CELL_PX_W,
            cell_px_h: DEFAULT_CELL_PX_H,
            truecolor,
            ssh,
            multiplexer,
        }
    }
}

fn terminal_kind(env: &HashMap<String, String>) -> TerminalKind {
    if env.contains_key("KITTY_WINDOW_ID") {
        return TerminalKind::Kitty;
    }
    if env.contains_key("ITERM_SESSION_ID") {
        return TerminalKind::Iterm2;
    }
    if env.contains_key("WEZTERM_EXECUTABLE") {
        return TerminalKind::WezTerm;
    }
    match env.get("TERM_PROGRAM").map(String::as_str) {
        Some("ghostty") => TerminalKind::Ghostty,
        Some("WezTerm") => TerminalKind::WezTerm,
        Some("iTerm.app") => TerminalKind::Iterm2,
        _ => TerminalKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_default_cell_pixel_size() {
        let caps = Capabilities::from_env(&HashMap::new(), None);
        assert_eq!(caps.cell_px_w, 8);
        assert_eq!(caps.cell_px_h, 16);
    }

    #[test]
    fn test_ssh_flag_set() {
        let caps = Capabilities::from_env(&env(&[("SSH_TTY", "/dev/pts/0")]), None);
        assert!(caps.ssh);
        assert_eq!(caps.protocol, Protocol::Halfblocks);
    }

    #[test]
    fn test_multiplexer_flag_set() {
        let caps = Capabilities::from_env(&env(&[("TMUX", "/tmp/tmux-0/default,1234,0")]), None);
        assert!(caps.multiplexer);
    }

    #[test]
    fn test_truecolor_flag() {
        let caps = Capabilities::from_env(&env(&[("COLORTERM", "truecolor")]), None);
        assert!(caps.truecolor);
        let caps = Capabilities::from_env(&env(&[("COLORTERM", "256color")]), None);
        assert!(!caps.truecolor);
    }

    #[test]
    fn test_cell_dimensions_from_env() {
        let caps = Capabilities::from_env(&env(&[("COLUMNS", "120"), ("LINES", "40")]), None);
        assert_eq!(caps.cell_cols, 120);
        assert_eq!(caps.cell_rows, 40);
    }
}

//! Protocol selection: terminal capability + user override -> `Protocol`

use std::collections::HashMap;

/// A terminal image rendering protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Kitty,
    Iterm2,
    Sixel,
    Halfblocks,
    None,
}

impl Protocol {
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Kitty => "kitty",
            Protocol::Iterm2 => "iterm2",
            Protocol::Sixel => "sixel",
            Protocol::Halfblocks => "halfblocks",
            Protocol::None => "none",
        }
    }
}

/// Coarse terminal identity, used only to drive auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Ghostty,
    Kitty,
    WezTerm,
    Iterm2,
    Other,
}

/// Map a user-supplied override string to a protocol. Returns `None` when
/// the override is empty, "auto", or unrecognized (caller should then fall
/// through to auto-detection).
fn map_override(raw: &str) -> Option<Protocol> {
    match raw {
        "kitty" => Some(Protocol::Kitty),
        "iterm2" => Some(Protocol::Iterm2),
        "sixel" => Some(Protocol::Sixel),
        "halfblocks" | "unicode" | "half-blocks" => Some(Protocol::Halfblocks),
        "none" | "off" | "disabled" => Some(Protocol::None),
        _ => None,
    }
}

fn detect_terminal_kind(env: &HashMap<String, String>) -> TerminalKind {
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

fn auto_detect(env: &HashMap<String, String>) -> Protocol {
    match detect_terminal_kind(env) {
        TerminalKind::Ghostty | TerminalKind::Kitty | TerminalKind::WezTerm => Protocol::Kitty,
        TerminalKind::Iterm2 => Protocol::Iterm2,
        TerminalKind::Other => Protocol::Halfblocks,
    }
}

fn is_ssh(env: &HashMap<String, String>) -> bool {
    env.contains_key("SSH_TTY") || env.contains_key("SSH_CONNECTION") || env.contains_key("SSH_CLIENT")
}

/// Select the active protocol given a captured environment snapshot and an
/// optional user override.
///
/// 1. A non-empty, non-"auto" override maps directly; an unrecognized
///    override falls through to auto-detection.
/// 2. Auto-detection inspects terminal-identifying environment variables.
/// 3. Under SSH, kitty/iterm2/sixel are degraded to halfblocks.
pub fn select(env: &HashMap<String, String>, override_str: Option<&str>) -> Protocol {
    let mut protocol = match override_str {
        Some(raw) if !raw.is_empty() && raw != "auto" => map_override(raw).unwrap_or_else(|| auto_detect(env)),
        _ => auto_detect(env),
    };

    if is_ssh(env) && matches!(protocol, Protocol::Kitty | Protocol::Iterm2 | Protocol::Sixel) {
        protocol = Protocol::Halfblocks;
    }

    protocol
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_explicit_override_wins() {
        let e = env(&[("TERM_PROGRAM", "ghostty")]);
        assert_eq!(select(&e, Some("halfblocks")), Protocol::Halfblocks);
    }

    #[test]
    fn test_override_aliases() {
        let e = HashMap::new();
        assert_eq!(select(&e, Some("unicode")), Protocol::Halfblocks);
        assert_eq!(select(&e, Some("half-blocks")), Protocol::Halfblocks);
        assert_eq!(select(&e, Some("off")), Protocol::None);
        assert_eq!(select(&e, Some("disabled")), Protocol::None);
    }

    #[test]
    fn test_unknown_override_falls_through_to_auto() {
        let e = env(&[("KITTY_WINDOW_ID", "1")]);
        assert_eq!(select(&e, Some("bogus")), Protocol::Kitty);
    }

    #[test]
    fn test_auto_detect_kitty_family() {
        assert_eq!(select(&env(&[("KITTY_WINDOW_ID", "1")]), None), Protocol::Kitty);
        assert_eq!(select(&env(&[("WEZTERM_EXECUTABLE", "/x")]), None), Protocol::Kitty);
        assert_eq!(
            select(&env(&[("TERM_PROGRAM", "ghostty")]), None),
            Protocol::Kitty
        );
    }

    #[test]
    fn test_auto_detect_iterm2() {
        assert_eq!(select(&env(&[("ITERM_SESSION_ID", "w0t0p0")]), None), Protocol::Iterm2);
    }

    #[test]
    fn test_auto_detect_default_is_halfblocks() {
        assert_eq!(select(&HashMap::new(), None), Protocol::Halfblocks);
    }

    #[test]
    fn test_ssh_degrades_kitty_iterm2_sixel_never_returns_them() {
        let e = env(&[("KITTY_WINDOW_ID", "1"), ("SSH_TTY", "/dev/pts/3")]);
        let p = select(&e, None);
        assert!(!matches!(p, Protocol::Kitty | Protocol::Iterm2 | Protocol::Sixel));
        assert_eq!(p, Protocol::Halfblocks);

        let e2 = env(&[("ITERM_SESSION_ID", "x"), ("SSH_CONNECTION", "1 2 3 4")]);
        assert_eq!(select(&e2, None), Protocol::Halfblocks);

        let e3 = env(&[("SSH_CLIENT", "1 2 3")]);
        assert_eq!(select(&e3, Some("sixel")), Protocol::Halfblocks);
    }

    #[test]
    fn test_ssh_does_not_degrade_halfblocks_or_none() {
        let e = env(&[("SSH_TTY", "/dev/pts/3")]);
        assert_eq!(select(&e, Some("halfblocks")), Protocol::Halfblocks);
        assert_eq!(select(&e, Some("none")), Protocol::None);
    }
}

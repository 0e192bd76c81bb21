//! Command catalog.
//!
//! Each [`Command`] describes one logical device operation. The 9-byte body
//! that travels inside a command frame is produced on demand by
//! [`Command::template`], so no template buffer is ever shared or mutated.

use std::fmt;

use super::constants::*;

/// Logical device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
    /// Switch fixtures to white.
    White,
    /// Hue byte, written to all four color slots.
    Color(u8),
    /// Percentage, clamped to 100.
    Brightness(u8),
    /// Built-in animation number.
    Mode(u8),
    ModeSlow,
    ModeFast,
}

/// Immutable 9-byte command body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate([u8; TEMPLATE_LEN]);

impl CommandTemplate {
    /// Build a template for the given kind and parameter bytes.
    fn new(kind: u8, params: &[u8]) -> Self {
        let mut bytes = [0u8; TEMPLATE_LEN];
        bytes[0] = CMD_CLASS;
        bytes[4] = kind;
        let end = (TEMPLATE_PARAM_OFFSET + params.len()).min(TEMPLATE_LEN);
        bytes[TEMPLATE_PARAM_OFFSET..end].copy_from_slice(&params[..end - TEMPLATE_PARAM_OFFSET]);
        Self(bytes)
    }

    /// Wrap raw body bytes.
    pub const fn from_bytes(bytes: [u8; TEMPLATE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TEMPLATE_LEN] {
        &self.0
    }
}

impl Command {
    /// Produce a fresh body for this command.
    pub fn template(&self) -> CommandTemplate {
        match *self {
            Command::On => CommandTemplate::new(CMD_KIND_SWITCH, &[SWITCH_ON]),
            Command::Off => CommandTemplate::new(CMD_KIND_SWITCH, &[SWITCH_OFF]),
            Command::White => CommandTemplate::new(CMD_KIND_SWITCH, &[SWITCH_WHITE]),
            Command::ModeSlow => CommandTemplate::new(CMD_KIND_SWITCH, &[SWITCH_MODE_SLOW]),
            Command::ModeFast => CommandTemplate::new(CMD_KIND_SWITCH, &[SWITCH_MODE_FAST]),
            Command::Color(hue) => CommandTemplate::new(CMD_KIND_COLOR, &[hue; 4]),
            Command::Brightness(level) => {
                CommandTemplate::new(CMD_KIND_BRIGHTNESS, &[level.min(MAX_BRIGHTNESS)])
            }
            Command::Mode(mode) => CommandTemplate::new(CMD_KIND_MODE, &[mode]),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::On => write!(f, "on"),
            Command::Off => write!(f, "off"),
            Command::White => write!(f, "white"),
            Command::Color(hue) => write!(f, "color({:#04X})", hue),
            Command::Brightness(level) => write!(f, "brightness({})", level),
            Command::Mode(mode) => write!(f, "mode({})", mode),
            Command::ModeSlow => write!(f, "mode-slow"),
            Command::ModeFast => write!(f, "mode-fast"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_bytes() {
        assert_eq!(
            Command::On.template().as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Command::Off.template().as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x03, 0x04, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Command::White.template().as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x03, 0x05, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Command::ModeSlow.template().as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x03, 0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Command::ModeFast.template().as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x03, 0x02, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_brightness_clamped() {
        let body = Command::Brightness(150).template();
        assert_eq!(body.as_bytes()[4], CMD_KIND_BRIGHTNESS);
        assert_eq!(body.as_bytes()[5], 100);

        let body = Command::Brightness(42).template();
        assert_eq!(body.as_bytes()[5], 42);
    }

    #[test]
    fn test_color_fills_all_slots() {
        let body = Command::Color(0x7F).template();
        assert_eq!(body.as_bytes()[4], CMD_KIND_COLOR);
        assert_eq!(&body.as_bytes()[5..9], &[0x7F; 4]);
    }

    #[test]
    fn test_mode_parameter() {
        let body = Command::Mode(6).template();
        assert_eq!(
            body.as_bytes(),
            &[0x31, 0x00, 0x00, 0x00, 0x04, 0x06, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_templates_are_independent() {
        // A parameterised command must not leak into later ones.
        let _ = Command::Color(0xAA).template();
        let body = Command::Color(0x01).template();
        assert_eq!(&body.as_bytes()[5..9], &[0x01; 4]);
    }
}

//! Wire constants for the WiFi bridge V6 protocol.

// UDP ports
pub const CONTROL_PORT: u16 = 5987;
pub const DISCOVERY_PORT: u16 = 48899;

// Discovery
pub const DISCOVERY_TOKEN: &[u8] = b"HF-A11ASSISTHREAD";
pub const ANNOUNCEMENT_FIELDS: usize = 3;
pub const MAX_DATAGRAM: usize = 1024;

/// Pre-computed login request. Opaque to this layer, sent verbatim.
pub const LOGIN_REQUEST: [u8; 27] = [
    0x20, 0x00, 0x00, 0x00, 0x16, 0x02, 0x62, 0x3A, 0xD5, 0xED, 0xA3, 0x01, 0xAE, 0x08, 0x2D,
    0x46, 0x61, 0x41, 0xA7, 0xF6, 0xDC, 0xAF, 0xD3, 0xE6, 0x00, 0x00, 0x1E,
];

// Login reply
pub const LOGIN_REPLY_LEN: usize = 22;
pub const LOGIN_REPLY_MARKER: u8 = 0x28;
pub const LOGIN_REPLY_ID1_OFFSET: usize = 19;
pub const LOGIN_REPLY_ID2_OFFSET: usize = 20;

// Command frame layout:
// header(5) | id1 | id2 | reserved | seq | reserved | body(9) | zone | reserved | checksum
pub const FRAME_LEN: usize = 22;
pub const FRAME_HEADER: [u8; 5] = [0x80, 0x00, 0x00, 0x00, 0x11];
pub const FRAME_ID1_OFFSET: usize = 5;
pub const FRAME_ID2_OFFSET: usize = 6;
pub const FRAME_SEQUENCE_OFFSET: usize = 8;
pub const FRAME_BODY_OFFSET: usize = 10;
pub const FRAME_ZONE_OFFSET: usize = 19;
pub const FRAME_CHECKSUM_OFFSET: usize = 21;

/// Only zone this client addresses.
pub const DEFAULT_ZONE: u8 = 0x01;

// Command template
pub const TEMPLATE_LEN: usize = 9;
pub const TEMPLATE_PARAM_OFFSET: usize = 5;

// Acknowledgment layout
pub const ACK_SEQUENCE_OFFSET: usize = 6;
pub const ACK_STATUS_OFFSET: usize = 7;
pub const ACK_MIN_LEN: usize = 8;
pub const ACK_STATUS_OK: u8 = 0x00;

// Command catalog
pub const CMD_CLASS: u8 = 0x31;
pub const CMD_KIND_COLOR: u8 = 0x01;
pub const CMD_KIND_BRIGHTNESS: u8 = 0x02;
pub const CMD_KIND_SWITCH: u8 = 0x03;
pub const CMD_KIND_MODE: u8 = 0x04;

pub const SWITCH_MODE_SLOW: u8 = 0x01;
pub const SWITCH_MODE_FAST: u8 = 0x02;
pub const SWITCH_ON: u8 = 0x03;
pub const SWITCH_OFF: u8 = 0x04;
pub const SWITCH_WHITE: u8 = 0x05;

pub const MAX_BRIGHTNESS: u8 = 100;

/// Animation mode used by the alert sequence.
pub const ALERT_MODE: u8 = 6;

//! Protocol module - wire format of the WiFi bridge V6.

pub mod command;
pub mod constants;
pub mod frame;

pub use command::{Command, CommandTemplate};
pub use constants::*;
pub use frame::{
    AckRejection, CommandFrame, FrameError, SessionId, check_ack, checksum, is_ack_for,
    parse_login_reply,
};

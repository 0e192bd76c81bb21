//! Command frame encoding and reply validation.

use std::fmt;

use thiserror::Error;

use super::command::CommandTemplate;
use super::constants::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Wrong length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("Invalid marker: expected 0x{expected:02X}, got 0x{actual:02X}")]
    InvalidMarker { expected: u8, actual: u8 },
}

/// Why an acknowledgment did not confirm a command.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckRejection {
    #[error("reply too short ({len} bytes)")]
    TooShort { len: usize },
    #[error("sequence mismatch: sent {expected}, echoed {got}")]
    SequenceMismatch { expected: u8, got: u8 },
    #[error("bridge reported status 0x{0:02X}")]
    Status(u8),
}

/// Two-byte capability token issued by the bridge at login.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionId(pub u8, pub u8);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({:02X} {:02X})", self.0, self.1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.0, self.1)
    }
}

/// Mod-256 sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// A fully framed 22-byte command.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_LEN]);

impl CommandFrame {
    pub const SIZE: usize = FRAME_LEN;

    /// Frame `template` for the given session and sequence number.
    pub fn encode(session_id: SessionId, sequence: u8, template: &CommandTemplate) -> Self {
        let mut buf = [0u8; FRAME_LEN];
        buf[..FRAME_HEADER.len()].copy_from_slice(&FRAME_HEADER);
        buf[FRAME_ID1_OFFSET] = session_id.0;
        buf[FRAME_ID2_OFFSET] = session_id.1;
        buf[FRAME_SEQUENCE_OFFSET] = sequence;
        buf[FRAME_BODY_OFFSET..FRAME_BODY_OFFSET + TEMPLATE_LEN]
            .copy_from_slice(template.as_bytes());
        buf[FRAME_ZONE_OFFSET] = DEFAULT_ZONE;
        buf[FRAME_CHECKSUM_OFFSET] = checksum(&buf[FRAME_BODY_OFFSET..=FRAME_ZONE_OFFSET]);
        Self(buf)
    }

    /// Decode a raw 22-byte frame. The checksum is not verified here.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FrameError> {
        let buf: [u8; FRAME_LEN] = data.try_into().map_err(|_| FrameError::WrongLength {
            expected: FRAME_LEN,
            actual: data.len(),
        })?;
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn session_id(&self) -> SessionId {
        SessionId(self.0[FRAME_ID1_OFFSET], self.0[FRAME_ID2_OFFSET])
    }

    pub fn sequence(&self) -> u8 {
        self.0[FRAME_SEQUENCE_OFFSET]
    }

    pub fn body(&self) -> &[u8] {
        &self.0[FRAME_BODY_OFFSET..FRAME_BODY_OFFSET + TEMPLATE_LEN]
    }

    pub fn zone(&self) -> u8 {
        self.0[FRAME_ZONE_OFFSET]
    }

    pub fn stored_checksum(&self) -> u8 {
        self.0[FRAME_CHECKSUM_OFFSET]
    }

    /// Recompute the checksum and compare with the stored byte.
    pub fn verify_checksum(&self) -> bool {
        checksum(&self.0[FRAME_BODY_OFFSET..=FRAME_ZONE_OFFSET]) == self.stored_checksum()
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandFrame(")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, ")")
    }
}

/// Check that `reply` acknowledges the frame sent with `sequence`.
pub fn check_ack(reply: &[u8], sequence: u8) -> Result<(), AckRejection> {
    if reply.len() < ACK_MIN_LEN {
        return Err(AckRejection::TooShort { len: reply.len() });
    }
    let echoed = reply[ACK_SEQUENCE_OFFSET];
    if echoed != sequence {
        return Err(AckRejection::SequenceMismatch {
            expected: sequence,
            got: echoed,
        });
    }
    match reply[ACK_STATUS_OFFSET] {
        ACK_STATUS_OK => Ok(()),
        status => Err(AckRejection::Status(status)),
    }
}

pub fn is_ack_for(reply: &[u8], sequence: u8) -> bool {
    check_ack(reply, sequence).is_ok()
}

/// Extract the session identifier from a login reply.
pub fn parse_login_reply(reply: &[u8]) -> Result<SessionId, FrameError> {
    if reply.len() != LOGIN_REPLY_LEN {
        return Err(FrameError::WrongLength {
            expected: LOGIN_REPLY_LEN,
            actual: reply.len(),
        });
    }
    if reply[0] != LOGIN_REPLY_MARKER {
        return Err(FrameError::InvalidMarker {
            expected: LOGIN_REPLY_MARKER,
            actual: reply[0],
        });
    }
    Ok(SessionId(
        reply[LOGIN_REPLY_ID1_OFFSET],
        reply[LOGIN_REPLY_ID2_OFFSET],
    ))
}

use super::{DecodeError, DecodeResult};
use crate::controller::stick::{RawStickSample, STICK_SAMPLE_LEN};
use crate::controller::Handedness;
use bytes::{Buf, Bytes};
use strum::Display;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum InputReportId {
    // 0x21 Input report carrying a subcommand reply
    SubcommandReply,
    // 0x30 Periodic input report
    Standard,
}

impl InputReportId {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x21 => Some(Self::SubcommandReply),
            0x30 => Some(Self::Standard),
            _ => None,
        }
    }
}

pub const BASIC_DATA_LEN: usize = 0x24;
pub const STANDARD_REPORT_LEN: usize = 0x2D;

/// Decoded periodic `0x30` report. Fields follow the wire order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StandardReport {
    pub latency_timer: u8,
    pub power_info: u8,
    pub right_pad_buttons: u8,
    pub shared_buttons: u8,
    pub left_pad_buttons: u8,
    pub left_stick: RawStickSample,
    pub right_stick: RawStickSample,
    pub motor_state: u8,
    pub basic_data: [u8; BASIC_DATA_LEN],
}

impl StandardReport {
    pub fn parse(payload: &[u8]) -> DecodeResult<Self> {
        DecodeError::check_at_least(STANDARD_REPORT_LEN, payload.len())?;
        let mut buf = payload;
        let latency_timer = buf.get_u8();
        let power_info = buf.get_u8();
        let right_pad_buttons = buf.get_u8();
        let shared_buttons = buf.get_u8();
        let left_pad_buttons = buf.get_u8();
        let left_stick = RawStickSample::decode(&buf[..STICK_SAMPLE_LEN])?;
        buf.advance(STICK_SAMPLE_LEN);
        let right_stick = RawStickSample::decode(&buf[..STICK_SAMPLE_LEN])?;
        buf.advance(STICK_SAMPLE_LEN);
        let motor_state = buf.get_u8();
        let mut basic_data = [0u8; BASIC_DATA_LEN];
        buf.copy_to_slice(&mut basic_data);
        Ok(Self {
            latency_timer,
            power_info,
            right_pad_buttons,
            shared_buttons,
            left_pad_buttons,
            left_stick,
            right_stick,
            motor_state,
            basic_data,
        })
    }

    /// The stick that belongs to a Joy-Con of the given handedness.
    pub fn stick(&self, handedness: Handedness) -> Option<RawStickSample> {
        match handedness {
            Handedness::Left => Some(self.left_stick),
            Handedness::Right => Some(self.right_stick),
            Handedness::Unknown => None,
        }
    }
}

// Timer, battery, 3 button bytes, 6 stick bytes and the vibrator byte echo
// the input state ahead of the reply. With the report id that makes 13.
pub const ACK_ECHO_LEN: usize = 12;
const ACK_CODE_LEN: usize = 2;

/// Decoded `0x21` subcommand reply.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubcommandAck {
    /// Ack byte followed by the id of the answered subcommand.
    pub code: u16,
    /// Reply bytes after the code.
    pub data: Bytes,
}

impl SubcommandAck {
    pub fn parse(payload: Bytes) -> DecodeResult<Self> {
        DecodeError::check_at_least(ACK_ECHO_LEN + ACK_CODE_LEN, payload.len())?;
        let code = u16::from_be_bytes([payload[ACK_ECHO_LEN], payload[ACK_ECHO_LEN + 1]]);
        Ok(Self {
            code,
            data: payload.slice(ACK_ECHO_LEN + ACK_CODE_LEN..),
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputReport {
    Standard(StandardReport),
    SubcommandAck(SubcommandAck),
    Unknown(u8),
}

impl InputReport {
    pub fn parse(report_id: u8, payload: Bytes) -> DecodeResult<Self> {
        match InputReportId::from_byte(report_id) {
            Some(InputReportId::Standard) => Ok(Self::Standard(StandardReport::parse(&payload)?)),
            Some(InputReportId::SubcommandReply) => {
                Ok(Self::SubcommandAck(SubcommandAck::parse(payload)?))
            }
            None => Ok(Self::Unknown(report_id)),
        }
    }
}

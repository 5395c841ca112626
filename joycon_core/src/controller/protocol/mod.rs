use strum::{Display, IntoStaticStr};
use thiserror::Error;

pub mod ack;
pub mod handshake;

pub use handshake::HandshakeState;

#[derive(Clone, Error, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    // The device info reply named neither a left nor a right Joy-Con.
    #[error("unsupported device type {0:#04x}, stick output stays uncalibrated")]
    UnsupportedDevice(u8),
    #[error("no pending handler for ack code {0:#06x}")]
    UnroutedAck(u16),
    #[error("unknown report id {0:#04x}")]
    UnknownReportId(u8),
    // The hex digits of the code do not start with a decimal digit.
    #[error("ack code {0:#06x} cannot be turned into a route key")]
    UnroutableAckCode(u16),
    // The handshake is waiting on the same ack key.
    #[error("ack code {0:#06x} is reserved by the handshake in progress")]
    AckBusy(u16),
    #[error("cannot {action} while the handshake is {state}")]
    InvalidState {
        action: HandshakeAction,
        state: HandshakeState,
    },
    #[error("session is closed")]
    Closed,
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HandshakeAction {
    Open,
    CompleteOpen,
    AcceptDeviceInfo,
    AcceptCalibration,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

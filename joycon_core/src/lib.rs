use controller::{protocol::ProtocolError, report::DecodeError};
use joycon_shared::event::EventError;
use thiserror::Error;

pub mod controller;
pub mod protocol_control;
pub mod transport;

#[derive(Clone, Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("io: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

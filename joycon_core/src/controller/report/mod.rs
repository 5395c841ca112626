use thiserror::Error;

pub mod input;
pub mod output;
pub mod subcommand;

#[derive(Clone, Error, Debug, Eq, PartialEq)]
pub enum DecodeError {
    // The decoder only accepts one exact byte count.
    #[error("invalid length: expected exactly {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    // The report is shorter than its fixed layout.
    #[error("truncated report: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    // Returned when a value or an address range falls outside what the
    // hardware accepts.
    #[error("out of bounds; invalid range")]
    OutOfBounds,
    // Calibration wiring depends on which Joy-Con the data came from.
    #[error("calibration cannot be decoded for a controller of unknown handedness")]
    UnknownHandedness,
}

impl DecodeError {
    pub(crate) fn check_exact(expected: usize, actual: usize) -> DecodeResult<()> {
        if expected != actual {
            return Err(Self::InvalidLength { expected, actual });
        }
        Ok(())
    }

    pub(crate) fn check_at_least(expected: usize, actual: usize) -> DecodeResult<()> {
        if actual < expected {
            return Err(Self::Truncated { expected, actual });
        }
        Ok(())
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

use super::{HandshakeAction, ProtocolError, ProtocolResult};
use crate::controller::calibration::CALIBRATION_BLOCK_LEN;
use crate::controller::spi_flash::SpiFlashRead;
use crate::controller::Handedness;
use crate::Result;
use strum::{Display, IntoStaticStr};

#[derive(
    Clone, Copy, Debug, Default, Display, Eq, PartialEq, Ord, PartialOrd, Hash, IntoStaticStr,
)]
pub enum HandshakeState {
    #[default]
    Disconnected,
    Opening,
    AwaitingDeviceInfo,
    AwaitingCalibration,
    Ready,
}

/// Drives a fresh connection to a calibrated session:
/// open, ask for device info, read the stick calibration of the reported
/// side, done.
///
/// There is no failure state. A device that is neither a left nor a right
/// Joy-Con stays in `AwaitingDeviceInfo` for good.
#[derive(Clone, Debug)]
pub struct HandshakeSequencer {
    state: HandshakeState,
    left_calibration_address: u32,
    right_calibration_address: u32,
}

impl HandshakeSequencer {
    pub fn new(left_calibration_address: u32, right_calibration_address: u32) -> Self {
        Self {
            state: HandshakeState::Disconnected,
            left_calibration_address,
            right_calibration_address,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn begin_open(&mut self) -> ProtocolResult<()> {
        self.advance(
            HandshakeAction::Open,
            HandshakeState::Disconnected,
            HandshakeState::Opening,
        )
    }

    /// The transport is open; the device info request goes out next.
    pub fn opened(&mut self) -> ProtocolResult<()> {
        self.advance(
            HandshakeAction::CompleteOpen,
            HandshakeState::Opening,
            HandshakeState::AwaitingDeviceInfo,
        )
    }

    /// Returns the calibration read to send for a known side, or `None` when
    /// the device cannot be calibrated.
    pub fn device_info_received(&mut self, handedness: Handedness) -> Result<Option<SpiFlashRead>> {
        self.expect(
            HandshakeAction::AcceptDeviceInfo,
            HandshakeState::AwaitingDeviceInfo,
        )?;
        let address = match handedness {
            Handedness::Left => self.left_calibration_address,
            Handedness::Right => self.right_calibration_address,
            Handedness::Unknown => return Ok(None),
        };
        let read = SpiFlashRead::new(address, CALIBRATION_BLOCK_LEN as u8)?;
        self.state = HandshakeState::AwaitingCalibration;
        Ok(Some(read))
    }

    pub fn expect_calibration(&self) -> ProtocolResult<()> {
        self.expect(
            HandshakeAction::AcceptCalibration,
            HandshakeState::AwaitingCalibration,
        )
    }

    pub fn calibrated(&mut self) -> ProtocolResult<()> {
        self.advance(
            HandshakeAction::AcceptCalibration,
            HandshakeState::AwaitingCalibration,
            HandshakeState::Ready,
        )
    }

    pub fn close(&mut self) {
        self.state = HandshakeState::Disconnected;
    }

    fn expect(&self, action: HandshakeAction, expected: HandshakeState) -> ProtocolResult<()> {
        if self.state != expected {
            return Err(ProtocolError::InvalidState {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    fn advance(
        &mut self,
        action: HandshakeAction,
        from: HandshakeState,
        to: HandshakeState,
    ) -> ProtocolResult<()> {
        self.expect(action, from)?;
        tracing::debug!("handshake: {} -> {}.", from, to);
        self.state = to;
        Ok(())
    }
}

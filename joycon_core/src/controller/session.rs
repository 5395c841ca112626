use super::calibration::{StickCalibration, CALIBRATION_BLOCK_LEN};
use super::info::DeviceInfo;
use super::protocol::ack::{AckRouter, RoutedAck};
use super::protocol::handshake::HandshakeSequencer;
use super::protocol::{HandshakeState, ProtocolError};
use super::report::input::{InputReport, StandardReport};
use super::report::output::{FrameBuilder, SubcommandFrame};
use super::report::subcommand::Subcommand;
use super::spi_flash::{
    SpiFlashReadReply, FACTORY_L_STICK_CALIBRATION, FACTORY_R_STICK_CALIBRATION,
};
use super::stick::{normalize, NormalizedStick};
use super::Handedness;
use crate::Result;
use bytes::Bytes;
use tokio::sync::oneshot;

const DEFAULT_LEFT_CALIBRATION_ADDRESS: u32 = FACTORY_L_STICK_CALIBRATION;
const DEFAULT_RIGHT_CALIBRATION_ADDRESS: u32 = FACTORY_R_STICK_CALIBRATION;

#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    pub left_calibration_address: Option<u32>,
    pub right_calibration_address: Option<u32>,
}

/// What to do with a routed subcommand reply.
#[derive(Debug)]
pub enum AckHandler {
    DeviceInfo,
    StickCalibration,
    Reply(oneshot::Sender<Bytes>),
}

/// A decoded standard report along with the stick of this session's side.
#[derive(Clone, Debug, PartialEq)]
pub struct InputState {
    pub report: StandardReport,
    // `None` until the device has told which side it is.
    pub stick: Option<NormalizedStick>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionOutput {
    /// A frame to write to the transport.
    Send(SubcommandFrame),
    Input(InputState),
    DeviceInfo(DeviceInfo),
    Calibrated(StickCalibration),
    /// Something odd happened that leaves the session usable.
    Diagnostic(ProtocolError),
}

/// Protocol state of one connected controller.
///
/// Does no I/O. Frames to send come back as [`SessionOutput::Send`] and the
/// caller writes them out in order.
#[derive(Debug)]
pub struct DeviceSession {
    config: SessionConfig,
    frames: FrameBuilder,
    handshake: HandshakeSequencer,
    handedness: Handedness,
    calibration: Option<StickCalibration>,
    device_info: Option<DeviceInfo>,
    pending_acks: AckRouter<AckHandler>,
}

impl DeviceSession {
    pub fn new(config: SessionConfig) -> Self {
        let left = config
            .left_calibration_address
            .unwrap_or(DEFAULT_LEFT_CALIBRATION_ADDRESS);
        let right = config
            .right_calibration_address
            .unwrap_or(DEFAULT_RIGHT_CALIBRATION_ADDRESS);
        Self {
            config,
            frames: FrameBuilder::new(),
            handshake: HandshakeSequencer::new(left, right),
            handedness: Handedness::Unknown,
            calibration: None,
            device_info: None,
            pending_acks: AckRouter::new(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn calibration(&self) -> Option<&StickCalibration> {
        self.calibration.as_ref()
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    pub fn pending_acks(&self) -> &AckRouter<AckHandler> {
        &self.pending_acks
    }

    /// Marks the session as opening, before the transport is opened.
    pub fn begin_open(&mut self) -> Result<()> {
        self.handshake.begin_open()?;
        Ok(())
    }

    /// The transport is open. Returns the device info request to send.
    #[tracing::instrument(target = "session", skip(self))]
    pub fn opened(&mut self) -> Result<SubcommandFrame> {
        self.handshake.opened()?;
        tracing::info!("requesting device info.");
        self.send(Subcommand::RequestDeviceInfo, &[], AckHandler::DeviceInfo)
    }

    /// Builds a frame for an arbitrary subcommand. The reply data is sent to
    /// `reply_tx` once the matching ack arrives.
    ///
    /// Refused with `AckBusy` while the handshake waits on the same ack key.
    /// Another request waiting there is replaced and sees its channel close.
    #[tracing::instrument(target = "session", skip(self, payload, reply_tx))]
    pub fn request(
        &mut self,
        subcommand: Subcommand,
        payload: &[u8],
        reply_tx: oneshot::Sender<Bytes>,
    ) -> Result<SubcommandFrame> {
        self.ensure_open()?;
        let code = subcommand.ack_code();
        if matches!(
            self.pending_acks.pending(code),
            Some(AckHandler::DeviceInfo | AckHandler::StickCalibration)
        ) {
            return Err(ProtocolError::AckBusy(code).into());
        }
        self.send(subcommand, payload, AckHandler::Reply(reply_tx))
    }

    /// Handles one inbound report.
    #[tracing::instrument(target = "session", skip(self, payload))]
    pub fn process_report(&mut self, report_id: u8, payload: Bytes) -> Result<Vec<SessionOutput>> {
        self.ensure_open()?;
        let outputs = match InputReport::parse(report_id, payload)? {
            InputReport::Standard(report) => {
                let stick = report
                    .stick(self.handedness)
                    .map(|raw| normalize(raw, self.calibration.as_ref()));
                vec![SessionOutput::Input(InputState { report, stick })]
            }
            InputReport::SubcommandAck(ack) => match self.pending_acks.route(&ack) {
                Some(routed) => self.handle_ack(routed)?,
                None => vec![SessionOutput::Diagnostic(ProtocolError::UnroutedAck(
                    ack.code,
                ))],
            },
            InputReport::Unknown(id) => {
                tracing::debug!("ignoring report with id {:#04x}.", id);
                vec![SessionOutput::Diagnostic(ProtocolError::UnknownReportId(id))]
            }
        };
        Ok(outputs)
    }

    /// Drops every pending handler and forgets the device. Waiting requests
    /// see their reply channel close.
    pub fn close(&mut self) {
        let config = std::mem::take(&mut self.config);
        *self = Self::new(config);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.handshake.state() == HandshakeState::Disconnected {
            return Err(ProtocolError::Closed.into());
        }
        Ok(())
    }

    // The handler is registered before the frame is stamped, so a refused
    // code does not consume a sequence number.
    fn send(
        &mut self,
        subcommand: Subcommand,
        payload: &[u8],
        handler: AckHandler,
    ) -> Result<SubcommandFrame> {
        self.pending_acks.register(subcommand.ack_code(), handler)?;
        Ok(self.frames.build(subcommand.to_byte(), payload))
    }

    fn handle_ack(&mut self, routed: RoutedAck<AckHandler>) -> Result<Vec<SessionOutput>> {
        match routed.handler {
            AckHandler::DeviceInfo => self.on_device_info(&routed.data),
            AckHandler::StickCalibration => self.on_stick_calibration(&routed.data),
            AckHandler::Reply(reply_tx) => {
                if reply_tx.send(routed.data).is_err() {
                    tracing::debug!("requester of ack code {:#06x} went away.", routed.code);
                }
                Ok(vec![])
            }
        }
    }

    fn on_device_info(&mut self, data: &[u8]) -> Result<Vec<SessionOutput>> {
        let info = DeviceInfo::parse(data)?;
        let handedness = info.handedness();
        let read = self.handshake.device_info_received(handedness)?;
        tracing::info!(
            "device info: {}, firmware {:#06x}, address {}.",
            info.controller_type(),
            info.firmware_version,
            info.mac_address
        );
        self.device_info = Some(info);
        self.handedness = handedness;
        let mut outputs = vec![SessionOutput::DeviceInfo(info)];
        match read {
            Some(read) => {
                tracing::info!(
                    "reading {} stick calibration at {:#06x}.",
                    handedness,
                    read.address()
                );
                let frame = self.send(
                    Subcommand::SpiFlashRead,
                    &read.to_payload(),
                    AckHandler::StickCalibration,
                )?;
                outputs.push(SessionOutput::Send(frame));
            }
            None => {
                tracing::warn!(
                    "unsupported device type {:#04x}, sticks stay uncalibrated.",
                    info.type_id
                );
                outputs.push(SessionOutput::Diagnostic(
                    ProtocolError::UnsupportedDevice(info.type_id),
                ));
            }
        }
        Ok(outputs)
    }

    fn on_stick_calibration(&mut self, data: &[u8]) -> Result<Vec<SessionOutput>> {
        self.handshake.expect_calibration()?;
        let reply = SpiFlashReadReply::parse(data)?;
        let calibration =
            StickCalibration::decode(reply.leading(CALIBRATION_BLOCK_LEN), self.handedness)?;
        self.handshake.calibrated()?;
        self.calibration = Some(calibration);
        tracing::info!("session ready, calibration: {:?}.", calibration);
        Ok(vec![SessionOutput::Calibrated(calibration)])
    }
}

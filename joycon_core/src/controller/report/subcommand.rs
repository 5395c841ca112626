use strum::{Display, IntoStaticStr};

// Ref: https://github.com/dekuNukem/Nintendo_Switch_Reverse_Engineering/blob/master/bluetooth_hid_subcommands_notes.md
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash, IntoStaticStr)]
pub enum Subcommand {
    RequestDeviceInfo,
    SetInputReportMode,
    TriggerButtonsElapsedTime,
    SetShipmentState,
    SpiFlashRead,
    SetNfcIrMcuConfig,
    SetNfcIrMcuState,
    SetPlayerLights,
    Enable6AxisSensor,
    EnableVibration,
}

impl Subcommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(Self::RequestDeviceInfo),
            0x03 => Some(Self::SetInputReportMode),
            0x04 => Some(Self::TriggerButtonsElapsedTime),
            0x08 => Some(Self::SetShipmentState),
            0x10 => Some(Self::SpiFlashRead),
            0x21 => Some(Self::SetNfcIrMcuConfig),
            0x22 => Some(Self::SetNfcIrMcuState),
            0x30 => Some(Self::SetPlayerLights),
            0x40 => Some(Self::Enable6AxisSensor),
            0x48 => Some(Self::EnableVibration),
            _ => None,
        }
    }

    pub fn to_byte(&self) -> u8 {
        match self {
            Self::RequestDeviceInfo => 0x02,
            Self::SetInputReportMode => 0x03,
            Self::TriggerButtonsElapsedTime => 0x04,
            Self::SetShipmentState => 0x08,
            Self::SpiFlashRead => 0x10,
            Self::SetNfcIrMcuConfig => 0x21,
            Self::SetNfcIrMcuState => 0x22,
            Self::SetPlayerLights => 0x30,
            Self::Enable6AxisSensor => 0x40,
            Self::EnableVibration => 0x48,
        }
    }

    /// The ack byte the controller puts in front of its reply. Bit 7 marks
    /// an ack, the low bits name the kind of data that follows.
    pub fn ack_byte(&self) -> u8 {
        match self {
            Self::RequestDeviceInfo => 0x82,
            Self::TriggerButtonsElapsedTime => 0x83,
            Self::SpiFlashRead => 0x90,
            Self::SetNfcIrMcuConfig => 0xA0,
            _ => 0x80,
        }
    }

    /// The 16-bit value echoed back in the reply: ack byte, then subcommand id.
    pub fn ack_code(&self) -> u16 {
        u16::from_be_bytes([self.ack_byte(), self.to_byte()])
    }
}

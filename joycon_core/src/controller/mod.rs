use strum::{Display, EnumString, IntoStaticStr};

pub mod calibration;
pub mod info;
pub mod protocol;
pub mod report;
pub mod session;
pub mod spi_flash;
pub mod stick;

#[derive(
    Clone, Copy, Default, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Display, EnumString,
)]
pub enum ControllerType {
    JoyConL,
    JoyConR,
    ProController,
    #[default]
    Unknown,
}

impl ControllerType {
    pub fn from_id(id: u8) -> Self {
        match id {
            0x01 => Self::JoyConL,
            0x02 => Self::JoyConR,
            0x03 => Self::ProController,
            _ => Self::Unknown,
        }
    }

    pub fn handedness(&self) -> Handedness {
        match self {
            Self::JoyConL => Handedness::Left,
            Self::JoyConR => Handedness::Right,
            // Pro Controller is detected but not driven.
            _ => Handedness::Unknown,
        }
    }
}

/// Which half of a Joy-Con pair the device is.
///
/// Decides both the calibration address to read and how the packed
/// calibration values are wired into center/min/max.
#[derive(
    Clone, Copy, Default, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Display, IntoStaticStr,
)]
pub enum Handedness {
    #[default]
    Unknown,
    Left,
    Right,
}

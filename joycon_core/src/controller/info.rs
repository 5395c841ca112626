use super::report::{DecodeError, DecodeResult};
use super::{ControllerType, Handedness};
use std::fmt;

const DEVICE_INFO_LEN: usize = 9;

/// Reply to the `0x02` device info subcommand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceInfo {
    pub firmware_version: u16,
    pub type_id: u8,
    pub mac_address: MacBytes,
}

impl DeviceInfo {
    pub fn parse(data: &[u8]) -> DecodeResult<Self> {
        DecodeError::check_at_least(DEVICE_INFO_LEN, data.len())?;
        let mut mac = [0u8; 5];
        mac.copy_from_slice(&data[4..DEVICE_INFO_LEN]);
        Ok(Self {
            firmware_version: u16::from_le_bytes([data[0], data[1]]),
            type_id: data[2],
            mac_address: MacBytes(mac),
        })
    }

    pub fn controller_type(&self) -> ControllerType {
        ControllerType::from_id(self.type_id)
    }

    pub fn handedness(&self) -> Handedness {
        self.controller_type().handedness()
    }
}

/// The five address bytes read from offset 4 of the device info reply.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct MacBytes(pub [u8; 5]);

impl fmt::Display for MacBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}")
    }
}

impl fmt::Debug for MacBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

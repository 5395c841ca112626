use super::report::{DecodeError, DecodeResult};
use super::Handedness;

pub const SPI_FLASH_SIZE: u32 = 0x80000;
// A single read reply carries at most this many bytes.
pub const SPI_FLASH_READ_MAX: u8 = 0x1D;
pub const SPI_FLASH_READ_HEADER_LEN: usize = 5;

pub const FACTORY_L_STICK_CALIBRATION: u32 = 0x603D;
pub const FACTORY_R_STICK_CALIBRATION: u32 = 0x6046;
pub const USER_L_STICK_CALIBRATION: u32 = 0x8012;
pub const USER_R_STICK_CALIBRATION: u32 = 0x801D;

pub fn factory_stick_calibration_address(handedness: Handedness) -> Option<u32> {
    match handedness {
        Handedness::Left => Some(FACTORY_L_STICK_CALIBRATION),
        Handedness::Right => Some(FACTORY_R_STICK_CALIBRATION),
        Handedness::Unknown => None,
    }
}

/// Payload of a `0x10` SPI flash read subcommand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SpiFlashRead {
    address: u32,
    size: u8,
}

impl SpiFlashRead {
    pub fn new(address: u32, size: u8) -> DecodeResult<Self> {
        let end = address.checked_add(u32::from(size));
        if size > SPI_FLASH_READ_MAX || end.map_or(true, |end| end > SPI_FLASH_SIZE) {
            return Err(DecodeError::OutOfBounds);
        }
        Ok(Self { address, size })
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    // [address as u32 LE][size]
    pub fn to_payload(&self) -> [u8; 5] {
        let mut buf = [0u8; SPI_FLASH_READ_HEADER_LEN];
        buf[..4].copy_from_slice(&self.address.to_le_bytes());
        buf[4] = self.size;
        buf
    }
}

/// Reply to an SPI flash read, after the ack code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpiFlashReadReply<'a> {
    pub address: u32,
    pub size: u8,
    data: &'a [u8],
}

impl<'a> SpiFlashReadReply<'a> {
    pub fn parse(bytes: &'a [u8]) -> DecodeResult<Self> {
        DecodeError::check_at_least(SPI_FLASH_READ_HEADER_LEN, bytes.len())?;
        let address = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Self {
            address,
            size: bytes[4],
            data: &bytes[SPI_FLASH_READ_HEADER_LEN..],
        })
    }

    /// Up to `len` bytes following the header. Ack replies are zero padded,
    /// so this does not rely on the echoed size.
    pub fn leading(&self, len: usize) -> &'a [u8] {
        &self.data[..len.min(self.data.len())]
    }
}

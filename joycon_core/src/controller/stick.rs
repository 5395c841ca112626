use super::calibration::StickCalibration;
use super::report::{DecodeError, DecodeResult};

pub const STICK_SAMPLE_LEN: usize = 3;

const STICK_VALUE_LIMIT: u16 = 0x1000;

/// Uncalibrated 12-bit position of one analog stick.
///
/// On the wire both axes share three bytes: the horizontal value takes the
/// first byte plus the low nibble of the second, the vertical value the high
/// nibble of the second byte plus the third byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct RawStickSample {
    pub horizontal: u16,
    pub vertical: u16,
}

impl RawStickSample {
    pub fn new(horizontal: u16, vertical: u16) -> DecodeResult<Self> {
        if horizontal >= STICK_VALUE_LIMIT || vertical >= STICK_VALUE_LIMIT {
            return Err(DecodeError::OutOfBounds);
        }
        Ok(Self {
            horizontal,
            vertical,
        })
    }

    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        DecodeError::check_exact(STICK_SAMPLE_LEN, bytes.len())?;
        let (horizontal, vertical) = unpack_pair(bytes[0], bytes[1], bytes[2]);
        Ok(Self {
            horizontal,
            vertical,
        })
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        let byte_1 = (self.horizontal & 0xFF) as u8;
        let byte_2 = ((self.horizontal >> 8) as u8 & 0x0F) | (((self.vertical & 0xF) as u8) << 4);
        let byte_3 = (self.vertical >> 4) as u8;
        [byte_1, byte_2, byte_3]
    }
}

/// Splits a packed triple into its two 12-bit values.
pub(crate) fn unpack_pair(low: u8, mid: u8, high: u8) -> (u16, u16) {
    let first = u16::from(low) | ((u16::from(mid) & 0x0F) << 8);
    let second = (u16::from(mid) >> 4) | (u16::from(high) << 4);
    (first, second)
}

/// Calibration-adjusted stick position.
///
/// Not clamped to `[-1, 1]`. A degenerate calibration (zero span on an axis)
/// produces `NaN` or an infinity on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedStick {
    pub x: f64,
    pub y: f64,
}

pub fn normalize(raw: RawStickSample, calibration: Option<&StickCalibration>) -> NormalizedStick {
    let h = f64::from(raw.horizontal);
    let v = f64::from(raw.vertical);
    let Some(cal) = calibration else {
        return NormalizedStick { x: h, y: v };
    };
    NormalizedStick {
        x: (h - f64::from(cal.center.x)) / f64::from(cal.max.x - cal.min.x),
        y: (v - f64::from(cal.center.y)) / f64::from(cal.max.y - cal.min.y),
    }
}

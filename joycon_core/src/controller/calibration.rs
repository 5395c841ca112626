use super::report::{DecodeError, DecodeResult};
use super::stick::unpack_pair;
use super::Handedness;

pub const CALIBRATION_BLOCK_LEN: usize = 9;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
}

/// The six 12-bit values packed in a calibration block, in storage order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CalibrationOffsets {
    pub x_above: u16,
    pub y_above: u16,
    pub x_center: u16,
    pub y_center: u16,
    pub x_below: u16,
    pub y_below: u16,
}

impl CalibrationOffsets {
    pub fn unpack(bytes: &[u8]) -> DecodeResult<Self> {
        DecodeError::check_exact(CALIBRATION_BLOCK_LEN, bytes.len())?;
        let (x_above, y_above) = unpack_pair(bytes[0], bytes[1], bytes[2]);
        let (x_center, y_center) = unpack_pair(bytes[3], bytes[4], bytes[5]);
        let (x_below, y_below) = unpack_pair(bytes[6], bytes[7], bytes[8]);
        Ok(Self {
            x_above,
            y_above,
            x_center,
            y_center,
            x_below,
            y_below,
        })
    }
}

/// Per-axis extents of a stick in the raw 12-bit domain.
///
/// `min < center < max` holds for sane hardware data but is not checked;
/// bad data flows through as a degenerate calibration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct StickCalibration {
    pub center: Axes,
    pub min: Axes,
    pub max: Axes,
}

impl StickCalibration {
    pub fn decode(bytes: &[u8], handedness: Handedness) -> DecodeResult<Self> {
        match handedness {
            Handedness::Left => Self::with_left_stick_bytes(bytes),
            Handedness::Right => Self::with_right_stick_bytes(bytes),
            Handedness::Unknown => Err(DecodeError::UnknownHandedness),
        }
    }

    // The left stick block stores the center in the middle triple, and its
    // maxima are taken crosswise from the first triple.
    pub fn with_left_stick_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let o = CalibrationOffsets::unpack(bytes)?;
        let center = Axes {
            x: i32::from(o.x_center),
            y: i32::from(o.y_center),
        };
        Ok(Self {
            center,
            min: Axes {
                x: center.x - i32::from(o.x_below),
                y: center.y - i32::from(o.y_below),
            },
            max: Axes {
                x: center.x + i32::from(o.y_above),
                y: center.y + i32::from(o.x_above),
            },
        })
    }

    pub fn with_right_stick_bytes(bytes: &[u8]) -> DecodeResult<Self> {
        let o = CalibrationOffsets::unpack(bytes)?;
        let center = Axes {
            x: i32::from(o.x_above),
            y: i32::from(o.y_above),
        };
        Ok(Self {
            center,
            min: Axes {
                x: center.x - i32::from(o.x_center),
                y: center.y - i32::from(o.y_center),
            },
            max: Axes {
                x: center.x + i32::from(o.x_below),
                y: center.y + i32::from(o.y_below),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Axes, CalibrationOffsets, StickCalibration};
    use crate::controller::report::DecodeError;
    use crate::controller::stick::{normalize, RawStickSample};
    use crate::controller::Handedness;

    fn pack(values: [u16; 6]) -> Vec<u8> {
        values
            .chunks(2)
            .flat_map(|pair| RawStickSample::new(pair[0], pair[1]).unwrap().to_bytes())
            .collect()
    }

    #[test]
    fn zero_block_decodes_to_zero_calibration() {
        for handedness in [Handedness::Left, Handedness::Right] {
            let cal = StickCalibration::decode(&[0u8; 9], handedness).unwrap();
            assert_eq!(cal, StickCalibration::default());
        }
    }

    #[test]
    fn single_byte_touches_only_its_own_pair() {
        let base = [0x12u8, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11];
        let before = CalibrationOffsets::unpack(&base).unwrap();
        let fields = |o: &CalibrationOffsets| {
            [
                o.x_above, o.y_above, o.x_center, o.y_center, o.x_below, o.y_below,
            ]
        };
        for i in 0..9 {
            let mut changed = base;
            changed[i] ^= 0xFF;
            let after = CalibrationOffsets::unpack(&changed).unwrap();
            let (old, new) = (fields(&before), fields(&after));
            for field in 0..6 {
                if field / 2 != i / 3 {
                    assert_eq!(old[field], new[field], "byte {i} leaked into field {field}");
                }
            }
            assert_ne!(old, new);
        }
    }

    #[test]
    fn left_wiring_takes_maxima_crosswise() {
        let bytes = pack([100, 200, 2000, 2100, 300, 400]);
        let cal = StickCalibration::decode(&bytes, Handedness::Left).unwrap();
        assert_eq!(cal.center, Axes { x: 2000, y: 2100 });
        assert_eq!(cal.min, Axes { x: 1700, y: 1700 });
        assert_eq!(cal.max, Axes { x: 2200, y: 2200 });
    }

    #[test]
    fn right_wiring_reads_center_first() {
        let bytes = pack([100, 200, 2000, 2100, 300, 400]);
        let cal = StickCalibration::decode(&bytes, Handedness::Right).unwrap();
        assert_eq!(cal.center, Axes { x: 100, y: 200 });
        assert_eq!(cal.min, Axes { x: -1900, y: -1900 });
        assert_eq!(cal.max, Axes { x: 400, y: 600 });
    }

    #[test]
    fn factory_defaults_are_symmetric() {
        let left = [0x00, 0x07, 0x70, 0x00, 0x08, 0x80, 0x00, 0x07, 0x70];
        let right = [0x00, 0x08, 0x80, 0x00, 0x07, 0x70, 0x00, 0x07, 0x70];
        let expected = StickCalibration {
            center: Axes { x: 0x800, y: 0x800 },
            min: Axes { x: 0x100, y: 0x100 },
            max: Axes { x: 0xF00, y: 0xF00 },
        };
        assert_eq!(
            StickCalibration::decode(&left, Handedness::Left).unwrap(),
            expected
        );
        assert_eq!(
            StickCalibration::decode(&right, Handedness::Right).unwrap(),
            expected
        );
    }

    #[test]
    fn degenerate_block_is_not_clamped() {
        let mut bytes = [0u8; 9];
        bytes[2] = 0xFF;
        let cal = StickCalibration::decode(&bytes, Handedness::Right).unwrap();
        // The high byte of the first pair lands in y_above only.
        assert_eq!(cal.center, Axes { x: 0, y: 0xFF0 });
        assert_eq!(cal.min, Axes { x: 0, y: 0xFF0 });
        assert_eq!(cal.max, Axes { x: 0, y: 0xFF0 });
        let stick = normalize(RawStickSample::new(0, 0).unwrap(), Some(&cal));
        assert!(stick.x.is_nan());
        assert_eq!(stick.y, f64::NEG_INFINITY);
    }

    #[test]
    fn rejects_wrong_length_and_unknown_handedness() {
        assert_eq!(
            StickCalibration::decode(&[0u8; 8], Handedness::Left),
            Err(DecodeError::InvalidLength {
                expected: 9,
                actual: 8
            })
        );
        assert_eq!(
            StickCalibration::decode(&[0u8; 10], Handedness::Right),
            Err(DecodeError::InvalidLength {
                expected: 9,
                actual: 10
            })
        );
        assert_eq!(
            StickCalibration::decode(&[0u8; 9], Handedness::Unknown),
            Err(DecodeError::UnknownHandedness)
        );
    }
}

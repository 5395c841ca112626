use bytes::{BufMut, Bytes, BytesMut};

pub const SUBCOMMAND_REPORT_ID: u8 = 0x01;
const RUMBLE_DATA_LEN: usize = 8;
// report id + sequence + rumble
const SUBCOMMAND_OFFSET: usize = 2 + RUMBLE_DATA_LEN;

/// An outbound `0x01` report: `[0x01][seq][rumble x8][subcommand][payload..]`.
///
/// Rumble is not supported, the rumble block is always zeroed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubcommandFrame {
    buf: Bytes,
}

impl SubcommandFrame {
    pub fn report_id(&self) -> u8 {
        self.buf[0]
    }

    pub fn sequence(&self) -> u8 {
        self.buf[1]
    }

    pub fn rumble_data(&self) -> &[u8] {
        &self.buf[2..SUBCOMMAND_OFFSET]
    }

    pub fn subcommand(&self) -> u8 {
        self.buf[SUBCOMMAND_OFFSET]
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[SUBCOMMAND_OFFSET + 1..]
    }

    /// Everything after the report id, as handed to the transport.
    pub fn report_payload(&self) -> Bytes {
        self.buf.slice(1..)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Stamps outbound subcommand frames with the per-device sequence counter.
#[derive(Clone, Debug, Default)]
pub struct FrameBuilder {
    counter: u8,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sequence byte the next frame will carry.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn build(&mut self, subcommand: u8, payload: &[u8]) -> SubcommandFrame {
        // Past 0xFF the frame gets 0 and the counter resumes at 1.
        let seq = self.counter;
        self.counter = self.counter.wrapping_add(1);
        let mut buf = BytesMut::with_capacity(SUBCOMMAND_OFFSET + 1 + payload.len());
        buf.put_u8(SUBCOMMAND_REPORT_ID);
        buf.put_u8(seq);
        buf.put_bytes(0x00, RUMBLE_DATA_LEN);
        buf.put_u8(subcommand);
        buf.put_slice(payload);
        SubcommandFrame { buf: buf.freeze() }
    }
}

use super::{ProtocolError, ProtocolResult};
use crate::controller::report::input::SubcommandAck;
use bytes::Bytes;
use std::collections::HashMap;

/// Key acks are matched under.
///
/// Both sides derive it the same way: the 16-bit code is rendered as
/// lowercase hex and the leading decimal digits of that text are read back
/// as a base-10 number, e.g. `0x8202 -> "8202" -> 8202` and
/// `0x9010 -> "9010" -> 9010`. Reading stops at the first hex letter
/// (`0x8a02 -> 8`), and a code whose text starts with a letter has no key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AckKey(u16);

impl AckKey {
    pub fn from_code(code: u16) -> Option<Self> {
        let hex = format!("{code:x}");
        let end = hex
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(hex.len());
        hex[..end].parse::<u16>().ok().map(Self)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

#[derive(Debug)]
pub struct RoutedAck<H> {
    pub key: AckKey,
    pub code: u16,
    pub handler: H,
    pub data: Bytes,
}

/// One-shot handlers waiting for subcommand replies.
///
/// A handler leaves the router the moment a reply is routed to it. Nothing
/// expires: a reply that never arrives keeps its handler pending until the
/// router is cleared.
#[derive(Debug)]
pub struct AckRouter<H> {
    pending: HashMap<AckKey, H>,
}

impl<H> Default for AckRouter<H> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<H> AckRouter<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for replies echoing `code`, returning a handler
    /// that was already waiting under the same key.
    pub fn register(&mut self, code: u16, handler: H) -> ProtocolResult<Option<H>> {
        let Some(key) = AckKey::from_code(code) else {
            return Err(ProtocolError::UnroutableAckCode(code));
        };
        let replaced = self.pending.insert(key, handler);
        if replaced.is_some() {
            tracing::warn!("replaced pending ack handler for key {}.", key.value());
        }
        Ok(replaced)
    }

    pub fn route(&mut self, ack: &SubcommandAck) -> Option<RoutedAck<H>> {
        let routed = AckKey::from_code(ack.code)
            .and_then(|key| self.pending.remove(&key).map(|handler| (key, handler)));
        let Some((key, handler)) = routed else {
            tracing::debug!("no pending handler for ack code {:#06x}.", ack.code);
            return None;
        };
        Some(RoutedAck {
            key,
            code: ack.code,
            handler,
            data: ack.data.clone(),
        })
    }

    /// The handler a reply echoing `code` would be routed to.
    pub fn pending(&self, code: u16) -> Option<&H> {
        AckKey::from_code(code).and_then(|key| self.pending.get(&key))
    }

    pub fn is_pending(&self, code: u16) -> bool {
        self.pending(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<H> AckRouter<H>
where
    H: FnOnce(Bytes),
{
    /// Routes `ack` and calls the matching handler with the reply data.
    /// Returns whether a handler ran.
    pub fn dispatch(&mut self, ack: &SubcommandAck) -> bool {
        match self.route(ack) {
            Some(routed) => {
                (routed.handler)(routed.data);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AckKey, AckRouter};
    use crate::controller::protocol::ProtocolError;
    use crate::controller::report::input::SubcommandAck;
    use crate::controller::report::subcommand::Subcommand;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    type Callback = Box<dyn FnOnce(Bytes) + Send>;

    fn ack(code: u16, data: &'static [u8]) -> SubcommandAck {
        SubcommandAck {
            code,
            data: Bytes::from_static(data),
        }
    }

    fn recording(calls: &Arc<Mutex<Vec<Vec<u8>>>>) -> Callback {
        let calls = calls.clone();
        Box::new(move |data: Bytes| calls.lock().unwrap().push(data.to_vec()))
    }

    #[test]
    fn key_is_hex_text_read_as_decimal() {
        assert_eq!(AckKey::from_code(0x8202).map(|k| k.value()), Some(8202));
        assert_eq!(AckKey::from_code(0x9010).map(|k| k.value()), Some(9010));
        assert_eq!(AckKey::from_code(0x0802).map(|k| k.value()), Some(802));
        assert_eq!(AckKey::from_code(0x0000).map(|k| k.value()), Some(0));
        assert_eq!(AckKey::from_code(0x9999).map(|k| k.value()), Some(9999));
    }

    #[test]
    fn key_stops_at_first_hex_letter() {
        assert_eq!(AckKey::from_code(0x8a02).map(|k| k.value()), Some(8));
        assert_eq!(AckKey::from_code(0x80ff).map(|k| k.value()), Some(80));
        assert_eq!(AckKey::from_code(0xA021), None);
    }

    #[test]
    fn handshake_subcommands_route_under_their_known_keys() {
        let device_info = AckKey::from_code(Subcommand::RequestDeviceInfo.ack_code()).unwrap();
        let spi_read = AckKey::from_code(Subcommand::SpiFlashRead.ack_code()).unwrap();
        assert_eq!(device_info.value(), 8202);
        assert_eq!(spi_read.value(), 9010);
    }

    #[test]
    fn invokes_matching_handler_exactly_once() {
        let calls = Arc::new(Mutex::new(vec![]));
        let mut router: AckRouter<Callback> = AckRouter::new();
        router.register(0x8202, recording(&calls)).unwrap();
        assert!(router.is_pending(0x8202));

        assert!(router.dispatch(&ack(0x8202, &[0x48, 0x03, 0x02])));
        assert!(!router.dispatch(&ack(0x8202, &[0x48, 0x03, 0x02])));

        assert_eq!(*calls.lock().unwrap(), vec![vec![0x48, 0x03, 0x02]]);
        assert!(router.is_empty());
    }

    #[test]
    fn unmatched_code_runs_nothing() {
        let calls = Arc::new(Mutex::new(vec![]));
        let mut router: AckRouter<Callback> = AckRouter::new();
        router.register(0x8202, recording(&calls)).unwrap();

        assert!(!router.dispatch(&ack(0x9010, &[])));
        assert!(!router.dispatch(&ack(0xA021, &[])));
        assert!(router.route(&ack(0xA021, &[])).is_none());
        assert!(router.route(&ack(0x9010, &[])).is_none());

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn codes_sharing_a_key_match_each_other() {
        let mut router = AckRouter::new();
        router.register(0x8a02, "first").unwrap();
        let routed = router.route(&ack(0x8b30, &[1])).unwrap();
        assert_eq!(routed.handler, "first");
        assert_eq!(routed.key.value(), 8);
        assert_eq!(routed.code, 0x8b30);
    }

    #[test]
    fn refuses_codes_without_a_key() {
        let mut router = AckRouter::new();
        assert_eq!(
            router.register(0xA021, ()),
            Err(ProtocolError::UnroutableAckCode(0xA021))
        );
        assert!(router.is_empty());
    }

    #[test]
    fn re_registering_replaces_the_waiting_handler() {
        let mut router = AckRouter::new();
        assert_eq!(router.register(0x9010, 1), Ok(None));
        assert_eq!(router.register(0x9010, 2), Ok(Some(1)));
        assert_eq!(router.route(&ack(0x9010, &[])).map(|r| r.handler), Some(2));
    }

    #[test]
    fn unanswered_handler_stays_pending() {
        let mut router = AckRouter::new();
        router.register(0x8202, ()).unwrap();
        for code in [0x9010, 0x8030, 0x8003] {
            assert!(router.route(&ack(code, &[])).is_none());
        }
        assert!(router.is_pending(0x8202));
        router.clear();
        assert!(!router.is_pending(0x8202));
    }
}

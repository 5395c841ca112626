use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Clone, Error, Debug)]
pub enum EventError {
    #[error("failed to subscribe events")]
    SubscriptionFailed,
}

/// A request for a new subscriber, answered once the relay has picked it up.
pub struct SubscriptionReq<T> {
    pub tx: mpsc::UnboundedSender<T>,
    pub ready_tx: oneshot::Sender<()>,
}

impl<T> SubscriptionReq<T> {
    pub fn new(tx: mpsc::UnboundedSender<T>, ready_tx: oneshot::Sender<()>) -> Self {
        Self { tx, ready_tx }
    }
}

/// Messages kept for the next subscriber while nobody is listening.
pub const EVENT_BACKLOG: usize = 64;

/// Generates `handle_events` and `subscribe` for an event type.
///
/// `handle_events` spawns a relay task that clones every message into each
/// live subscriber, dropping subscribers whose receiver went away. While
/// nobody is subscribed the relay keeps only the latest [`EVENT_BACKLOG`]
/// messages and hands them to the next subscriber. Once the sending side is
/// gone, late subscribers still get that backlog before their stream ends.
#[macro_export]
macro_rules! setup_event {
    ($event_type:ty) => {
        pub fn handle_events(
            mut msg_rx: ::tokio::sync::mpsc::UnboundedReceiver<$event_type>,
            mut sub_rx: ::tokio::sync::mpsc::Receiver<$crate::event::SubscriptionReq<$event_type>>,
        ) -> std::result::Result<(), $crate::event::EventError> {
            ::tokio::spawn(async move {
                let mut subs: Vec<::tokio::sync::mpsc::UnboundedSender<$event_type>> = vec![];
                let mut backlog: ::std::collections::VecDeque<$event_type> =
                    ::std::collections::VecDeque::new();
                let mut msg_closed = false;
                loop {
                    ::tokio::select! {
                        biased;
                        msg = msg_rx.recv(), if !msg_closed => {
                            match msg {
                                Some(evt) => {
                                    subs.retain(|tx| tx.send(evt.clone()).is_ok());
                                    if subs.is_empty() {
                                        if backlog.len() == $crate::event::EVENT_BACKLOG {
                                            backlog.pop_front();
                                        }
                                        backlog.push_back(evt);
                                    }
                                }
                                None => {
                                    msg_closed = true;
                                    subs.clear();
                                }
                            }
                        },
                        sub_opts = sub_rx.recv() => {
                            match sub_opts {
                                Some($crate::event::SubscriptionReq { tx, ready_tx }) => {
                                    for evt in backlog.drain(..) {
                                        let _ = tx.send(evt);
                                    }
                                    let _ = ready_tx.send(());
                                    if !msg_closed {
                                        subs.push(tx);
                                    }
                                }
                                None => break,
                            };
                        },
                    }
                }
            });
            Ok(())
        }

        pub async fn subscribe(
            sub_tx: &::tokio::sync::mpsc::Sender<$crate::event::SubscriptionReq<$event_type>>,
        ) -> std::result::Result<
            ::tokio::sync::mpsc::UnboundedReceiver<$event_type>,
            $crate::event::EventError,
        > {
            let (tx, rx) = ::tokio::sync::mpsc::unbounded_channel();
            let (ready_tx, ready_rx) = ::tokio::sync::oneshot::channel();
            sub_tx
                .send($crate::event::SubscriptionReq::new(tx, ready_tx))
                .await
                .map_err(|_| $crate::event::EventError::SubscriptionFailed)?;
            ready_rx
                .await
                .map_err(|_| $crate::event::EventError::SubscriptionFailed)?;
            Ok(rx)
        }
    };
}

pub use crate::setup_event;

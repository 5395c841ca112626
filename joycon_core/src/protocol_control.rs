use crate::controller::calibration::StickCalibration;
use crate::controller::info::DeviceInfo;
use crate::controller::protocol::{HandshakeState, ProtocolError};
use crate::controller::report::output::SubcommandFrame;
use crate::controller::report::subcommand::Subcommand;
use crate::controller::session::{DeviceSession, InputState, SessionConfig, SessionOutput};
use crate::transport::Transport;
use crate::{Error, Result};
use bytes::Bytes;
use joycon_shared::event::SubscriptionReq;
use joycon_shared::setup_event;
use std::future::Future;
use std::sync::Arc;
use strum::{Display, IntoStaticStr};
use tokio::sync::{mpsc, oneshot, watch};

const DEFAULT_COMMAND_CAPACITY: usize = 32;
const REPORT_QUEUE_CAPACITY: usize = 64;

#[derive(Clone, Debug, Default)]
pub struct ControlConfig {
    pub command_capacity: Option<usize>,
    pub session: SessionConfig,
}

#[derive(Debug)]
pub(crate) enum Command {
    Request {
        subcommand: Subcommand,
        payload: Bytes,
        ack_tx: oneshot::Sender<Bytes>,
        sent_tx: oneshot::Sender<Result<()>>,
    },
}

/// Drives one controller over a [`Transport`].
///
/// A single task owns the session. It handles each inbound report to the
/// end before taking the next one, and writes out every frame the session
/// produces.
#[derive(Debug)]
pub struct ProtocolControl {
    cmd_tx: mpsc::Sender<Command>,
    closed_tx: mpsc::Sender<()>,
    event_sub_tx: mpsc::Sender<SubscriptionReq<Event>>,
    input_rx: watch::Receiver<Option<InputState>>,
}

/// Keeps the connection alive. Dropping it closes the session and the
/// transport.
pub struct ProtocolHandle {
    _close_rx: mpsc::Receiver<()>,
}

impl ProtocolControl {
    /// Opens the transport and starts the handshake.
    #[tracing::instrument(target = "protocol_control", skip_all)]
    pub async fn connect<T: Transport>(
        transport: T,
        config: ControlConfig,
    ) -> Result<(Self, ProtocolHandle)> {
        let transport = Arc::new(transport);
        let mut session = DeviceSession::new(config.session);
        session.begin_open()?;
        tracing::info!("opening transport...");
        transport.open().await?;
        let frame = session.opened()?;
        if let Err(err) = write_frame(transport.as_ref(), &frame).await {
            transport.close().await;
            return Err(err);
        }

        let (close_tx, close_rx) = mpsc::channel::<()>(1);
        let (closed_tx, closed_rx) = mpsc::channel::<()>(1);
        let (cmd_tx, cmd_rx) = mpsc::channel(
            config
                .command_capacity
                .unwrap_or(DEFAULT_COMMAND_CAPACITY),
        );
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (event_sub_tx, event_sub_rx) = mpsc::channel(1);
        let (input_tx, input_rx) = watch::channel(None);
        Event::handle_events(msg_rx, event_sub_rx)?;
        let _ = msg_tx.send(Event::Log(LogType::Handshake(session.state())));

        tokio::spawn(async move {
            let (report_tx, report_rx) = mpsc::channel(REPORT_QUEUE_CAPACITY);
            let reader = tokio::spawn(ProtocolControlTask::setup_reader(
                transport.clone(),
                report_tx,
            ));
            let mut task = ProtocolControlTask {
                session,
                transport: transport.clone(),
                msg_tx: msg_tx.clone(),
                input_tx,
            };
            let res = tokio::select! {
                res = task.run(report_rx, cmd_rx) => res,
                _ = close_tx.closed() => {
                    tracing::info!("protocol handle dropped, closing session.");
                    Ok(())
                },
            };
            reader.abort();
            task.session.close();
            transport.close().await;
            if let Err(err) = res {
                tracing::warn!("protocol task ended: {}", err);
                let _ = msg_tx.send(Event::Critical(err));
            }
            let _ = msg_tx.send(Event::Log(LogType::Closed));
            drop(closed_rx);
        });

        Ok((
            Self {
                cmd_tx,
                closed_tx,
                event_sub_tx,
                input_rx,
            },
            ProtocolHandle {
                _close_rx: close_rx,
            },
        ))
    }

    /// Sends a subcommand and waits for its reply data.
    ///
    /// Waits as long as it takes; wrap in `tokio::time::timeout` to bound it.
    pub async fn request(&self, subcommand: Subcommand, payload: &[u8]) -> Result<Bytes> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let (sent_tx, sent_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Request {
                subcommand,
                payload: Bytes::copy_from_slice(payload),
                ack_tx,
                sent_tx,
            })
            .await
            .map_err(|_| ProtocolError::Closed)?;
        sent_rx.await.map_err(|_| ProtocolError::Closed)??;
        ack_rx
            .await
            .map_err(|_| Error::from(ProtocolError::Closed))
    }

    // Listen for the protocol control events.
    pub async fn events(&self) -> Result<mpsc::UnboundedReceiver<Event>> {
        Ok(Event::subscribe(&self.event_sub_tx).await?)
    }

    /// The latest decoded standard report. Only the newest one is kept, so
    /// a slow reader skips samples instead of falling behind.
    pub fn inputs(&self) -> watch::Receiver<Option<InputState>> {
        self.input_rx.clone()
    }

    // Wait for the internal task to exit completely.
    pub fn closed(&self) -> impl Future<Output = ()> {
        let closed_tx = self.closed_tx.clone();
        async move { closed_tx.closed().await }
    }
}

struct ProtocolControlTask<T: Transport> {
    session: DeviceSession,
    transport: Arc<T>,
    msg_tx: mpsc::UnboundedSender<Event>,
    input_tx: watch::Sender<Option<InputState>>,
}

impl<T: Transport> ProtocolControlTask<T> {
    async fn setup_reader(
        transport: Arc<T>,
        report_tx: mpsc::Sender<std::io::Result<(u8, Bytes)>>,
    ) {
        loop {
            let report = match transport.recv_report().await {
                Ok(Some(report)) => Ok(report),
                Ok(None) => break,
                Err(err) => Err(err),
            };
            let failed = report.is_err();
            if report_tx.send(report).await.is_err() || failed {
                break;
            }
        }
    }

    async fn run(
        &mut self,
        mut report_rx: mpsc::Receiver<std::io::Result<(u8, Bytes)>>,
        mut cmd_rx: mpsc::Receiver<Command>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                report = report_rx.recv() => match report {
                    Some(Ok((report_id, payload))) => self.process_report(report_id, payload).await?,
                    Some(Err(err)) => return Err(err.into()),
                    None => {
                        tracing::info!("device is gone.");
                        return Ok(());
                    }
                },
                Some(cmd) = cmd_rx.recv() => self.process_command(cmd).await?,
            }
        }
    }

    async fn process_report(&mut self, report_id: u8, payload: Bytes) -> Result<()> {
        let before = self.session.state();
        match self.session.process_report(report_id, payload) {
            Ok(outputs) => {
                for output in outputs {
                    self.dispatch(output).await?;
                }
            }
            Err(err) => {
                tracing::warn!("failed to process report {:#04x}: {}", report_id, err);
                self.emit(Event::Warning(err));
            }
        }
        let after = self.session.state();
        if after != before {
            self.emit(Event::Log(LogType::Handshake(after)));
        }
        Ok(())
    }

    async fn process_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Request {
                subcommand,
                payload,
                ack_tx,
                sent_tx,
            } => {
                let frame = match self.session.request(subcommand, &payload, ack_tx) {
                    Ok(frame) => frame,
                    Err(err) => {
                        let _ = sent_tx.send(Err(err));
                        return Ok(());
                    }
                };
                match write_frame(self.transport.as_ref(), &frame).await {
                    Ok(()) => {
                        let _ = sent_tx.send(Ok(()));
                        Ok(())
                    }
                    Err(err) => {
                        let _ = sent_tx.send(Err(err.clone()));
                        Err(err)
                    }
                }
            }
        }
    }

    async fn dispatch(&self, output: SessionOutput) -> Result<()> {
        let evt = match output {
            SessionOutput::Send(frame) => return write_frame(self.transport.as_ref(), &frame).await,
            SessionOutput::Input(state) => {
                self.input_tx.send_replace(Some(state));
                return Ok(());
            }
            SessionOutput::DeviceInfo(info) => Event::DeviceInfo(info),
            SessionOutput::Calibrated(calibration) => Event::Ready(calibration),
            SessionOutput::Diagnostic(err) => {
                tracing::warn!("{}", err);
                Event::Warning(err.into())
            }
        };
        self.emit(evt);
        Ok(())
    }

    fn emit(&self, evt: Event) {
        let _ = self.msg_tx.send(evt);
    }
}

async fn write_frame<T: Transport>(transport: &T, frame: &SubcommandFrame) -> Result<()> {
    transport
        .send_report(frame.report_id(), &frame.report_payload())
        .await?;
    Ok(())
}

#[derive(Clone, Debug)]
pub enum Event {
    Log(LogType),
    DeviceInfo(DeviceInfo),
    // The stick calibration has been read, the handshake is over.
    Ready(StickCalibration),
    Warning(Error),
    Critical(Error),
}

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash, IntoStaticStr)]
pub enum LogType {
    Handshake(HandshakeState),
    Closed,
}

impl Event {
    setup_event!(Event);
}

//! Connection loop: drives one relay connection on a cooperative loop.
//!
//! Lifecycle: `Disconnected → Connecting → Connected → Closing → Disconnected`.
//! While connected, one `select!` interleaves three sources: the shutdown
//! signal (always polled first), inbound frames, and the producer (console
//! lines or interval ticks). Every exit path releases the connection handle
//! exactly once.

use crate::console::Console;
use crate::dispatch::HookDispatcher;
use crate::error::{RuntimeError, RuntimeResult};
use crate::hooks::SendTrigger;
use crate::input::{ComposeStep, InputComposer, InputMode};
use relayhook_types::config::ClientConfig;
use relayhook_types::error::RelayHookError;
use relayhook_types::message::{Content, Message};
use relayhook_wire::{ConnectionHandle, ConnectionState, WireError};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Where send triggers come from.
pub enum Producer {
    /// Console lines, composed into messages.
    Console(Box<dyn Console>),
    /// A send tick every interval, without input.
    Interval(Duration),
    /// No send triggers; the loop only receives.
    Idle,
}

impl Producer {
    /// Console producer.
    pub fn console(console: impl Console + 'static) -> Self {
        Self::Console(Box::new(console))
    }

    fn activate(self) -> ActiveProducer {
        match self {
            Self::Console(console) => ActiveProducer::Console(console),
            Self::Interval(period) => ActiveProducer::Interval(tokio::time::interval(period)),
            Self::Idle => ActiveProducer::Idle,
        }
    }
}

enum ActiveProducer {
    Console(Box<dyn Console>),
    Interval(tokio::time::Interval),
    Idle,
}

enum ProducerEvent {
    Line(io::Result<Option<String>>),
    Tick,
}

impl ActiveProducer {
    async fn next_event(&mut self) -> ProducerEvent {
        match self {
            Self::Console(console) => ProducerEvent::Line(console.next_line().await),
            Self::Interval(interval) => {
                interval.tick().await;
                ProducerEvent::Tick
            }
            Self::Idle => std::future::pending::<ProducerEvent>().await,
        }
    }
}

enum LoopEvent {
    Frame(Result<Option<Message>, WireError>),
    Producer(ProducerEvent),
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Inbound messages dispatched.
    pub inbound: u64,
    /// Messages transmitted.
    pub outbound: u64,
    /// Inbound handler and receive hook failures isolated during dispatch.
    pub handler_failures: u64,
}

/// Owns the relay connection and drives dispatch.
pub struct ConnectionLoop<R = OwnedReadHalf, W = OwnedWriteHalf> {
    handle: Option<ConnectionHandle<R, W>>,
    dispatcher: HookDispatcher,
    composer: InputComposer,
    producer: Producer,
    state_tx: watch::Sender<ConnectionState>,
    summary: RunSummary,
}

impl ConnectionLoop {
    /// Connect to the relay named in `config`.
    ///
    /// A failed connection is fatal: it is returned to the caller and the
    /// loop never starts.
    pub async fn connect(
        config: &ClientConfig,
        dispatcher: HookDispatcher,
        producer: Producer,
    ) -> RuntimeResult<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let addr = config.relay_addr();
        state_tx.send_replace(ConnectionState::Connecting);
        info!(agent = %config.name, relay = %addr, "Connecting");

        match relayhook_wire::connect(&addr, config.max_frame_bytes).await {
            Ok(handle) => Ok(Self::build(
                handle,
                dispatcher,
                producer,
                InputMode::from_flag(config.multiline),
                state_tx,
            )),
            Err(e) => {
                state_tx.send_replace(ConnectionState::Disconnected);
                error!(relay = %addr, error = %e, "Could not connect to relay");
                Err(e.into())
            }
        }
    }
}

impl<R, W> ConnectionLoop<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Build a loop over an already established connection.
    pub fn with_handle(
        handle: ConnectionHandle<R, W>,
        dispatcher: HookDispatcher,
        producer: Producer,
        mode: InputMode,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Connecting);
        Self::build(handle, dispatcher, producer, mode, state_tx)
    }

    fn build(
        handle: ConnectionHandle<R, W>,
        dispatcher: HookDispatcher,
        producer: Producer,
        mode: InputMode,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            handle: Some(handle),
            dispatcher,
            composer: InputComposer::new(mode),
            producer,
            state_tx,
            summary: RunSummary::default(),
        }
    }

    /// Observe connection state transitions.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
        info!(%state, "Connection state changed");
    }

    /// Run until shutdown is signalled, the relay closes the connection, or
    /// a fatal error occurs. The connection is released on every path.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RuntimeResult<RunSummary> {
        let Some(mut handle) = self.handle.take() else {
            return Err(RelayHookError::ShuttingDown.into());
        };
        let mut producer = std::mem::replace(&mut self.producer, Producer::Idle).activate();

        self.set_state(ConnectionState::Connected);
        let result = self.drive(&mut handle, &mut producer, &mut shutdown).await;

        self.set_state(ConnectionState::Closing);
        if self.composer.cancel() {
            debug!("Discarded partial console input");
        }
        handle.close().await;
        self.set_state(ConnectionState::Disconnected);

        if let Err(e) = &result {
            error!(error = %e, "Connection loop stopped");
        }
        result.map(|()| self.summary.clone())
    }

    async fn drive(
        &mut self,
        handle: &mut ConnectionHandle<R, W>,
        producer: &mut ActiveProducer,
        shutdown: &mut watch::Receiver<bool>,
    ) -> RuntimeResult<()> {
        if let ActiveProducer::Console(console) = producer {
            console
                .show_prompt(self.composer.prompt())
                .await
                .map_err(RuntimeError::Console)?;
        }

        loop {
            if *shutdown.borrow() {
                info!("Interrupt received, closing connection");
                return Ok(());
            }

            let event = tokio::select! {
                biased;
                changed = shutdown.changed() => match changed {
                    Ok(()) => continue,
                    Err(_) => {
                        debug!("Shutdown signal dropped, closing connection");
                        return Ok(());
                    }
                },
                frame = handle.reader.next_message() => LoopEvent::Frame(frame),
                next = producer.next_event() => LoopEvent::Producer(next),
            };

            match event {
                LoopEvent::Frame(Ok(Some(msg))) => {
                    self.summary.inbound += 1;
                    let report = self.dispatcher.dispatch_inbound(msg).await;
                    self.summary.handler_failures += report.failed as u64;
                }
                LoopEvent::Frame(Ok(None)) => {
                    info!("Relay closed the connection");
                    return Ok(());
                }
                LoopEvent::Frame(Err(WireError::FrameTooLarge { size, max })) => {
                    warn!(size, max, "Skipping oversized inbound frame");
                }
                LoopEvent::Frame(Err(e)) => return Err(e.into()),
                LoopEvent::Producer(ProducerEvent::Line(Ok(Some(line)))) => {
                    if let ActiveProducer::Console(console) = producer {
                        self.on_line(&line, console.as_mut(), handle).await?;
                    }
                }
                LoopEvent::Producer(ProducerEvent::Line(Ok(None))) => {
                    info!("Console input closed, continuing to receive");
                    if self.composer.cancel() {
                        debug!("Discarded partial console input");
                    }
                    *producer = ActiveProducer::Idle;
                }
                LoopEvent::Producer(ProducerEvent::Line(Err(e))) => {
                    return Err(RuntimeError::Console(e));
                }
                LoopEvent::Producer(ProducerEvent::Tick) => {
                    self.send_tick(None, handle).await?;
                }
            }
        }
    }

    async fn on_line(
        &mut self,
        line: &str,
        console: &mut dyn Console,
        handle: &mut ConnectionHandle<R, W>,
    ) -> RuntimeResult<()> {
        let prompt = self.composer.prompt();
        match self.composer.feed(line) {
            ComposeStep::Continue { echoed, cleaned } => {
                console
                    .redraw_continued(prompt, &echoed, &cleaned)
                    .await
                    .map_err(RuntimeError::Console)?;
            }
            ComposeStep::Complete(body) => {
                let content = self.dispatcher.codec().encode(&body);
                self.send_tick(Some(content), handle).await?;
            }
        }
        console
            .show_prompt(self.composer.prompt())
            .await
            .map_err(RuntimeError::Console)
    }

    /// Tick every outbound route once and transmit what they produce.
    async fn send_tick(
        &mut self,
        input: Option<Content>,
        handle: &mut ConnectionHandle<R, W>,
    ) -> RuntimeResult<()> {
        let routes: Vec<String> = self
            .dispatcher
            .registry()
            .outbound_routes()
            .into_iter()
            .map(String::from)
            .collect();

        for route in routes {
            let trigger = match &input {
                Some(content) => SendTrigger::with_input(route, content.clone()),
                None => SendTrigger::tick(route),
            };
            if let Some(msg) = self.dispatcher.dispatch_outbound(&trigger).await {
                handle.send(&msg).await?;
                self.summary.outbound += 1;
                debug!(route = %trigger.route, type_tag = %msg.type_tag, "Sent message");
            }
        }
        Ok(())
    }
}

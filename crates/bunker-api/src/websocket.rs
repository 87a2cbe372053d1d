//! Change notification feed with auto-reconnect.
//!
//! A [`NotificationTransport`] owns exactly one logical WebSocket connection
//! to the backend's `/ws/updates` endpoint. Parsed [`ChangeEvent`]s fan out
//! through a [`tokio::sync::broadcast`] channel and the most recent one is
//! also kept in a [`tokio::sync::watch`] holder. Connection state is
//! observable the same way.
//!
//! # Example
//!
//! ```rust,ignore
//! use bunker_api::websocket::{NotificationTransport, ReconnectConfig};
//! use url::Url;
//!
//! let ws_url = Url::parse("ws://localhost:8080/ws/updates")?;
//! let transport = NotificationTransport::new(ws_url, ReconnectConfig::default());
//! let mut rx = transport.subscribe();
//! transport.connect();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event}");
//! }
//!
//! transport.disconnect();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, protocol::frame::coding::CloseCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::event::ChangeEvent;

// ── Constants ────────────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Fixed delay between a close and the next dial.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ── Connection state ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot published on every state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Retries scheduled since the last successful open.
    pub retry_count: u32,
    /// Deadline of the pending retry timer, if one is armed.
    pub next_retry: Option<Instant>,
    /// Successful opens since the transport was created.
    pub opened: u64,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before redialing after a close. Default: 5s.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

// ── NotificationTransport ────────────────────────────────────────────

/// Handle to the single notification connection.
///
/// Cheap to clone; all clones drive the same connection. `connect()` and
/// `disconnect()` must be called from inside a tokio runtime.
#[derive(Clone)]
pub struct NotificationTransport {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    reconnect: ReconnectConfig,
    status_tx: watch::Sender<ConnectionStatus>,
    latest_tx: watch::Sender<Option<Arc<ChangeEvent>>>,
    event_tx: broadcast::Sender<Arc<ChangeEvent>>,
    control: Mutex<Control>,
}

/// Mutable connection bookkeeping. Every transition happens under this lock.
#[derive(Default)]
struct Control {
    next_id: u64,
    session: Option<Session>,
    retry: Option<PendingRetry>,
    retry_count: u32,
    opened: u64,
    stopped: bool,
}

struct Session {
    id: u64,
    cancel: CancellationToken,
}

struct PendingRetry {
    id: u64,
    timer: JoinHandle<()>,
}

impl NotificationTransport {
    pub fn new(url: Url, reconnect: ReconnectConfig) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::default());
        let (latest_tx, _) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                url,
                reconnect,
                status_tx,
                latest_tx,
                event_tx,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Ensure a connection attempt is in flight or established.
    ///
    /// No-op while connecting or connected. A pending retry timer is
    /// cancelled and the dial happens now.
    pub fn connect(&self) {
        let mut control = self.inner.lock();
        control.stopped = false;
        if control.session.is_some() {
            return;
        }
        if let Some(retry) = control.retry.take() {
            retry.timer.abort();
        }
        self.inner.dial(&mut control);
    }

    /// Tear the connection down and stay down until the next `connect()`.
    pub fn disconnect(&self) {
        let mut control = self.inner.lock();
        control.stopped = true;
        if let Some(session) = control.session.take() {
            session.cancel.cancel();
        }
        if let Some(retry) = control.retry.take() {
            retry.timer.abort();
        }
        self.inner.publish(&control, ConnectionState::Disconnected, None);
        tracing::info!(url = %self.inner.url, "notification feed disconnected");
    }

    /// Receiver for every event, in arrival order.
    ///
    /// A consumer that falls behind gets
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ChangeEvent>> {
        self.inner.event_tx.subscribe()
    }

    /// The most recently received event.
    pub fn latest_event(&self) -> watch::Receiver<Option<Arc<ChangeEvent>>> {
        self.inner.latest_tx.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, control: &Control, state: ConnectionState, next_retry: Option<Instant>) {
        self.status_tx.send_if_modified(|status| {
            let next = ConnectionStatus {
                state,
                retry_count: control.retry_count,
                next_retry,
                opened: control.opened,
            };
            if *status == next {
                false
            } else {
                *status = next;
                true
            }
        });
    }

    /// Start a new session. Caller holds the lock and has checked that no
    /// session is live.
    fn dial(self: &Arc<Self>, control: &mut Control) {
        control.next_id += 1;
        let id = control.next_id;
        let cancel = CancellationToken::new();
        control.session = Some(Session {
            id,
            cancel: cancel.clone(),
        });
        self.publish(control, ConnectionState::Connecting, None);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_session(id, cancel).await;
        });
    }

    async fn run_session(self: Arc<Self>, id: u64, cancel: CancellationToken) {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            result = self.connect_and_read(id, &cancel) => result,
        };

        match result {
            Ok(()) => tracing::info!(session = id, "notification feed closed"),
            Err(e) => tracing::warn!(session = id, error = %e, "notification feed error"),
        }

        if !cancel.is_cancelled() {
            self.on_closed(id);
        }
    }

    /// Establish a single WebSocket connection and read until it drops.
    async fn connect_and_read(&self, id: u64, cancel: &CancellationToken) -> Result<(), Error> {
        tracing::info!(url = %self.url, session = id, "connecting to notification feed");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        self.on_open(id);

        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                frame = read.next() => {
                    match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            self.handle_text(text.as_str());
                        }
                        Some(Ok(tungstenite::Message::Ping(_))) => {
                            // tungstenite queues the pong itself
                            tracing::trace!("notification feed ping");
                        }
                        Some(Ok(tungstenite::Message::Close(frame))) => {
                            return match frame {
                                Some(cf) if cf.code != CloseCode::Normal && cf.code != CloseCode::Away => {
                                    Err(Error::WebSocketClosed {
                                        code: cf.code.into(),
                                        reason: cf.reason.to_string(),
                                    })
                                }
                                _ => Ok(()),
                            };
                        }
                        Some(Err(e)) => {
                            return Err(Error::WebSocketConnect(e.to_string()));
                        }
                        None => {
                            tracing::debug!("notification stream ended");
                            return Ok(());
                        }
                        _ => {
                            // Binary, Pong, Frame
                        }
                    }
                }
            }
        }
    }

    fn handle_text(&self, text: &str) {
        match ChangeEvent::parse(text) {
            Ok(event) => {
                tracing::debug!(event = %event, "change event received");
                let event = Arc::new(event);
                self.latest_tx.send_replace(Some(Arc::clone(&event)));
                // No receivers is fine.
                let _ = self.event_tx.send(event);
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed change event");
            }
        }
    }

    fn on_open(&self, id: u64) {
        let mut control = self.lock();
        if control.session.as_ref().map(|s| s.id) != Some(id) {
            return;
        }
        control.retry_count = 0;
        control.opened += 1;
        if let Some(retry) = control.retry.take() {
            retry.timer.abort();
        }
        self.publish(&control, ConnectionState::Connected, None);
        tracing::info!(url = %self.url, session = id, "notification feed connected");
    }

    /// The only place a retry gets scheduled.
    fn on_closed(self: &Arc<Self>, id: u64) {
        let mut control = self.lock();
        match control.session.as_ref().map(|s| s.id) {
            Some(live) if live == id => control.session = None,
            // A superseded session; the live one owns the state.
            Some(_) => return,
            None => {}
        }

        if control.stopped {
            self.publish(&control, ConnectionState::Disconnected, None);
            return;
        }
        if let Some(retry) = &control.retry {
            let deadline = self.status_tx.borrow().next_retry;
            tracing::debug!(timer = retry.id, "retry already pending");
            self.publish(&control, ConnectionState::Disconnected, deadline);
            return;
        }

        control.retry_count += 1;
        control.next_id += 1;
        let timer_id = control.next_id;
        let deadline = Instant::now() + self.reconnect.delay;

        let inner = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.on_retry_due(timer_id);
        });
        control.retry = Some(PendingRetry {
            id: timer_id,
            timer,
        });

        tracing::info!(
            delay_ms = u64::try_from(self.reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            attempt = control.retry_count,
            "scheduling notification feed reconnect"
        );
        self.publish(&control, ConnectionState::Disconnected, Some(deadline));
    }

    fn on_retry_due(self: &Arc<Self>, timer_id: u64) {
        let mut control = self.lock();
        if control.retry.as_ref().map(|r| r.id) != Some(timer_id) {
            return;
        }
        control.retry = None;
        if control.stopped || control.session.is_some() {
            return;
        }
        self.dial(&mut control);
    }

    #[cfg(test)]
    fn has_pending_retry(&self) -> bool {
        self.lock().retry.is_some()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

//! Discovery channel
//!
//! A channel announces the registry once and then emits liveness pings until
//! it closes. Each channel owns its interval timer, so closing or dropping
//! the channel stops the timer in the same step.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::BoxFuture;
use futures::{FutureExt, Stream};
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::ErrorKind;
use crate::mcp::credential::CredentialGuard;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::{events, DiscoverySnapshot, LivenessSignal};

/// One message delivered on a discovery channel
#[derive(Debug, Clone)]
pub enum DiscoverySignal {
    Tools(DiscoverySnapshot),
    Ping(LivenessSignal),
    Error { error: String, kind: ErrorKind },
}

impl DiscoverySignal {
    pub fn event_name(&self) -> &'static str {
        match self {
            DiscoverySignal::Tools(_) => events::TOOLS,
            DiscoverySignal::Ping(_) => events::PING,
            DiscoverySignal::Error { .. } => events::ERROR,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            DiscoverySignal::Tools(snapshot) => json!(snapshot),
            DiscoverySignal::Ping(ping) => json!(ping),
            DiscoverySignal::Error { error, kind } => json!({ "error": error, "kind": kind }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelState {
    Open,
    Closed,
}

/// Why a channel closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerDisconnected,
    Shutdown,
    CredentialRejected,
}

/// Opens discovery channels and tracks how many are live
pub struct DiscoveryHub {
    registry: Arc<ToolRegistry>,
    guard: Arc<CredentialGuard>,
    ping_interval: Duration,
    open: Arc<AtomicUsize>,
    next_id: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl DiscoveryHub {
    pub fn new(
        registry: Arc<ToolRegistry>,
        guard: Arc<CredentialGuard>,
        ping_interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            guard,
            ping_interval,
            open: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    /// What a newly opened channel would announce
    pub fn snapshot(&self) -> DiscoverySnapshot {
        self.registry.snapshot()
    }

    /// Open a channel for a newly connected peer.
    ///
    /// Without a credential the channel carries a single error signal and
    /// then closes; no snapshot is sent.
    pub fn open(&self) -> DiscoveryChannel {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.open.fetch_add(1, Ordering::SeqCst);

        let mut rx = self.shutdown.subscribe();
        let shutdown = async move {
            loop {
                if *rx.borrow_and_update() {
                    break;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        .boxed();

        let (pending, ticker) = match self.guard.require() {
            Ok(_) => {
                let mut ticker = tokio::time::interval_at(
                    Instant::now() + self.ping_interval,
                    self.ping_interval,
                );
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                (DiscoverySignal::Tools(self.registry.snapshot()), Some(ticker))
            }
            Err(e) => (
                DiscoverySignal::Error {
                    error: e.to_string(),
                    kind: e.kind(),
                },
                None,
            ),
        };

        tracing::info!(channel = id, "Discovery channel opened");

        DiscoveryChannel {
            id,
            state: ChannelState::Open,
            pending: Some(pending),
            ticker,
            last_t: 0,
            open: self.open.clone(),
            shutdown,
        }
    }

    /// Number of channels currently in the open state
    pub fn open_channels(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Close every open channel
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

/// A single peer's discovery stream
pub struct DiscoveryChannel {
    id: u64,
    state: ChannelState,
    pending: Option<DiscoverySignal>,
    ticker: Option<Interval>,
    last_t: u64,
    open: Arc<AtomicUsize>,
    shutdown: BoxFuture<'static, ()>,
}

impl DiscoveryChannel {
    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Server-side close
    pub fn close(&mut self) {
        self.transition_closed(CloseReason::Shutdown);
    }

    fn transition_closed(&mut self, reason: CloseReason) {
        if self.state == ChannelState::Closed {
            return;
        }
        self.state = ChannelState::Closed;
        self.ticker = None;
        self.pending = None;
        self.open.fetch_sub(1, Ordering::SeqCst);
        tracing::info!(channel = self.id, reason = ?reason, "Discovery channel closed");
    }

    /// Milliseconds since the epoch, forced strictly increasing per channel
    fn next_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last_t = now.max(self.last_t + 1);
        self.last_t
    }
}

impl Stream for DiscoveryChannel {
    type Item = DiscoverySignal;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state == ChannelState::Closed {
            return Poll::Ready(None);
        }

        if this.shutdown.poll_unpin(cx).is_ready() {
            this.transition_closed(CloseReason::Shutdown);
            return Poll::Ready(None);
        }

        if let Some(signal) = this.pending.take() {
            return Poll::Ready(Some(signal));
        }

        let Some(ticker) = this.ticker.as_mut() else {
            this.transition_closed(CloseReason::CredentialRejected);
            return Poll::Ready(None);
        };

        match ticker.poll_tick(cx) {
            Poll::Ready(_) => {
                let t = this.next_timestamp();
                Poll::Ready(Some(DiscoverySignal::Ping(LivenessSignal { t })))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for DiscoveryChannel {
    fn drop(&mut self) {
        self.transition_closed(CloseReason::PeerDisconnected);
    }
}

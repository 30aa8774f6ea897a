//! Cooperative shutdown: the `exit` command raises a flag, a supervising task
//! notices it (or an external abort), stops the listener, and reports why.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound between supervisor checks of the shutdown flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Process-wide "exit requested" flag. Set at most once, never cleared.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake waiters. Returns true only for the first call.
    pub fn request(&self) -> bool {
        let first = !self.inner.requested.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolve once the flag is raised (immediately if it already is).
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // register before checking so a concurrent request() is not missed
            notified.as_mut().enable();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Whether the HTTP listener is currently inside its serve loop.
#[derive(Clone, Default)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A spawned axum server that can be stopped gracefully from another task.
pub struct ServerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
    running: RunningFlag,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Spawn `app` on the already-bound `listener`. The running flag is raised
    /// before this returns and lowered when the serve loop ends for any reason.
    pub fn spawn(listener: TcpListener, app: Router, running: RunningFlag) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let flag = running.clone();
        running.set();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                tracing::error!("HTTP server error: {}", e);
            }
            flag.clear();
        });
        Ok(Self {
            token,
            task,
            running,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.is_set()
    }

    /// Stop accepting connections and wait for the request in flight, if any.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("HTTP server task failed: {}", e);
        }
        self.running.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The `exit` command raised the shutdown signal.
    ExitRequested,
    /// The hosting environment asked us to stop (Ctrl+C, SIGTERM).
    Aborted,
}

/// Watch `signal` and `abort` until one fires, then stop `server` if it is
/// still serving. The flag is also re-checked every `poll_interval`.
pub async fn supervise<F>(
    signal: &ShutdownSignal,
    server: ServerHandle,
    abort: F,
    poll_interval: Duration,
) -> ShutdownReason
where
    F: Future<Output = ()>,
{
    tokio::pin!(abort);
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            biased;
            _ = signal.wait() => break ShutdownReason::ExitRequested,
            _ = &mut abort => break ShutdownReason::Aborted,
            _ = ticker.tick() => {
                if signal.is_requested() {
                    break ShutdownReason::ExitRequested;
                }
            }
        }
    };
    // an exit that raced the abort still counts as an exit
    let reason = if signal.is_requested() {
        ShutdownReason::ExitRequested
    } else {
        reason
    };

    if server.is_running() {
        tracing::info!("Stopping listener on {}", server.local_addr());
        server.stop().await;
    }
    reason
}

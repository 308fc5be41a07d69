//! Trailing-edge debouncer.
//!
//! A background task owns at most one pending value and the deadline at which
//! it fires. Every push replaces the pending value and moves the deadline to
//! `now + window`; the value is handed to the apply callback only once the
//! window elapses without another push. Earlier values are dropped, never
//! merged.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

enum Command<P> {
    Push(P, Instant),
    Flush(oneshot::Sender<()>),
    Cancel,
}

pub struct Debouncer<P> {
    window: Duration,
    commands: mpsc::UnboundedSender<Command<P>>,
    shutdown: CancellationToken,
}

impl<P: Send + 'static> Debouncer<P> {
    /// Starts the debounce task on the current tokio runtime.
    ///
    /// # Panics
    /// When called outside a tokio runtime.
    pub fn spawn<F>(
        window: Duration,
        apply: F,
    ) -> Self
    where
        F: FnMut(P) + Send + 'static,
    {
        let (commands, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        tokio::spawn(run(receiver, shutdown.clone(), apply));
        Self {
            window,
            commands,
            shutdown,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replaces the pending value and restarts the window.
    /// Returns `false` once the debouncer is closed.
    pub fn push(
        &self,
        value: P,
    ) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        let deadline = Instant::now() + self.window;
        self.commands.send(Command::Push(value, deadline)).is_ok()
    }

    /// Applies the pending value now, if any, and waits until it has been
    /// applied.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).is_ok() {
            // The task may exit before acknowledging when closed concurrently.
            let _ = done.await;
        }
    }

    /// Drops the pending value without applying it.
    pub fn cancel_pending(&self) {
        let _ = self.commands.send(Command::Cancel);
    }

    /// Stops the task. A pending value is discarded.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl<P> Drop for Debouncer<P> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run<P, F>(
    mut commands: mpsc::UnboundedReceiver<Command<P>>,
    shutdown: CancellationToken,
    mut apply: F,
) where
    F: FnMut(P),
{
    let mut pending: Option<(P, Instant)> = None;

    loop {
        let deadline = pending.as_ref().map(|(_, at)| *at);
        let sleep_target = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                if pending.is_some() {
                    debug!("debouncer closed with a pending update; discarding it");
                }
                break;
            }

            command = commands.recv() => match command {
                Some(Command::Push(value, at)) => {
                    pending = Some((value, at));
                }
                Some(Command::Flush(ack)) => {
                    if let Some((value, _)) = pending.take() {
                        apply(value);
                    }
                    let _ = ack.send(());
                }
                Some(Command::Cancel) => {
                    if pending.take().is_some() {
                        debug!("pending update cancelled");
                    }
                }
                None => break,
            },

            _ = sleep_until(sleep_target), if deadline.is_some() => {
                if let Some((value, _)) = pending.take() {
                    apply(value);
                }
            }
        }
    }
}

// File: ./src/writer.rs
//! Where session snapshots go when the host pauses or is destroyed.
use crate::context::AppContext;
use crate::model::SessionSnapshot;
use crate::storage::SessionStorage;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// Fire-and-forget persistence. Implementations must not report failures
/// back to the caller; they log them.
pub trait SnapshotSink: Send + Sync {
    fn persist(&self, snapshot: SessionSnapshot);

    /// Newest snapshot handed to this sink that may not be on disk yet.
    /// Restores prefer it over the session file.
    fn latest(&self) -> Option<SessionSnapshot> {
        None
    }
}

/// Writes on the calling thread. Used by the CLI and tests.
#[derive(Debug, Clone)]
pub struct DirectSink {
    ctx: Arc<dyn AppContext>,
}

impl DirectSink {
    pub fn new(ctx: Arc<dyn AppContext>) -> Self {
        Self { ctx }
    }
}

impl SnapshotSink for DirectSink {
    fn persist(&self, snapshot: SessionSnapshot) {
        if let Err(e) = SessionStorage::save(self.ctx.as_ref(), &snapshot) {
            log::error!("Failed to save session: {:#}", e);
        }
    }
}

enum WriterMessage {
    Persist(SessionSnapshot),
    Flush(oneshot::Sender<()>),
}

/// Background writer actor. Snapshots are written in arrival order on the
/// blocking pool, so the last one queued is the one left on disk.
#[derive(Clone)]
pub struct SnapshotWriter {
    tx: mpsc::UnboundedSender<WriterMessage>,
    latest: Arc<Mutex<Option<SessionSnapshot>>>,
}

impl SnapshotWriter {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(ctx: Arc<dyn AppContext>) -> Self {
        Self::spawn_on(&tokio::runtime::Handle::current(), ctx)
    }

    pub fn spawn_on(handle: &tokio::runtime::Handle, ctx: Arc<dyn AppContext>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriterMessage>();

        handle.spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    WriterMessage::Persist(mut snapshot) => {
                        // Only the newest queued snapshot matters.
                        let mut pending_flush = Vec::new();
                        while let Ok(next) = rx.try_recv() {
                            match next {
                                WriterMessage::Persist(newer) => snapshot = newer,
                                WriterMessage::Flush(ack) => pending_flush.push(ack),
                            }
                        }

                        let ctx = ctx.clone();
                        let count = snapshot.paths.len();
                        let result = tokio::task::spawn_blocking(move || {
                            SessionStorage::save(ctx.as_ref(), &snapshot)
                        })
                        .await;
                        match result {
                            Ok(Ok(())) => log::debug!("Session saved ({} files)", count),
                            Ok(Err(e)) => log::error!("Failed to save session: {:#}", e),
                            Err(e) => log::error!("Session writer task failed: {}", e),
                        }

                        for ack in pending_flush {
                            let _ = ack.send(());
                        }
                    }
                    WriterMessage::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            log::debug!("Session writer stopped");
        });

        Self {
            tx,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Resolves once every snapshot queued before this call is on disk.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriterMessage::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl SnapshotSink for SnapshotWriter {
    fn persist(&self, snapshot: SessionSnapshot) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        if self.tx.send(WriterMessage::Persist(snapshot)).is_err() {
            log::error!("Session writer is gone, snapshot dropped");
        }
    }

    fn latest(&self) -> Option<SessionSnapshot> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

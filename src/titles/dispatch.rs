//! In-process event dispatch.
//!
//! Stands in for the host platform's event bus: a Tokio task owns the engine
//! and drains an unbounded channel of commands. Handler failures are logged
//! and skipped so one bad event cannot stall delivery for other users.

use tokio::sync::{mpsc, oneshot};

use super::engine::{EngineStats, TitleEngine, TitleEvent};

pub enum EngineCommand {
    Event(TitleEvent),
    Snapshot(oneshot::Sender<EngineStats>),
    Shutdown(oneshot::Sender<()>),
}

/// Cheap cloneable handle for publishing events into the dispatcher task.
#[derive(Clone, Debug)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl DispatcherHandle {
    /// Enqueue one event. Delivery is fire-and-forget; a closed dispatcher
    /// drops the event.
    pub fn publish(&self, event: TitleEvent) {
        let _ = self.tx.send(EngineCommand::Event(event));
    }

    /// Current engine counters, or `None` when the dispatcher has stopped.
    pub async fn snapshot(&self) -> Option<EngineStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(EngineCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    /// Drain already-queued commands and stop the dispatcher task.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(EngineCommand::Shutdown(tx));
        let _ = rx.await;
    }
}

/// Spawn the dispatcher task around an engine and return its handle.
pub fn start_dispatcher(mut engine: TitleEngine) -> DispatcherHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<EngineCommand>();
    let handle = DispatcherHandle { tx };

    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                EngineCommand::Event(event) => {
                    let kind = event.kind();
                    if let Err(e) = engine.handle_event(event).await {
                        log::warn!("titles: {} event handling failed: {}", kind, e);
                    }
                }
                EngineCommand::Snapshot(resp) => {
                    let _ = resp.send(engine.stats());
                }
                EngineCommand::Shutdown(done) => {
                    let _ = done.send(());
                    break;
                }
            }
        }
        log::debug!("title dispatcher loop terminated");
    });

    handle
}

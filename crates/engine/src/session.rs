use crate::engine::Engine;
use crate::error::{LensError, Result};
use crate::fetch::{FetchTicket, SourceFetcher};
use lens_page::{Document, ElementId};
use lens_scanner::{ScanOutcome, ScanReason, ScanSchedule, ScanScheduleConfig};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex as TokioMutex};
use tokio::time::{self, Instant};

/// Published after every scan the session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanUpdate {
    pub reason: ScanReason,
    pub changed: bool,
    pub rebuild_count: u64,
    pub files: usize,
}

enum SessionCommand {
    Trigger(ScanReason),
    Force(ScanReason),
    ArmRetries,
    Cancel,
    Shutdown,
}

/// Async driver around an [`Engine`]: paces rescans and runs content fetches
/// without holding the engine lock across the fetch.
pub struct LensSession<D: Document + Send + 'static> {
    inner: Arc<SessionInner<D>>,
}

impl<D: Document + Send + 'static> Clone for LensSession<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct SessionInner<D: Document + Send + 'static> {
    engine: Arc<TokioMutex<Engine<D>>>,
    fetcher: Arc<dyn SourceFetcher>,
    command_tx: mpsc::Sender<SessionCommand>,
    update_tx: broadcast::Sender<ScanUpdate>,
}

impl<D: Document + Send + 'static> LensSession<D> {
    /// Spawn the rescan loop. Must be called inside a tokio runtime.
    pub fn start(engine: Engine<D>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let schedule = engine.config().schedule_config();
        let engine = Arc::new(TokioMutex::new(engine));
        let (command_tx, command_rx) = mpsc::channel(64);
        let (update_tx, _) = broadcast::channel(32);

        spawn_rescan_loop(engine.clone(), schedule, command_rx, update_tx.clone());

        Self {
            inner: Arc::new(SessionInner {
                engine,
                fetcher,
                command_tx,
                update_tx,
            }),
        }
    }

    pub fn engine(&self) -> Arc<TokioMutex<Engine<D>>> {
        self.inner.engine.clone()
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ScanUpdate> {
        self.inner.update_tx.subscribe()
    }

    /// First scan plus the staggered retries for late-rendering pages.
    pub async fn initialize(&self) -> Result<ScanOutcome> {
        let outcome = self.inner.engine.lock().await.initialize();
        self.send(SessionCommand::ArmRetries).await?;
        Ok(outcome)
    }

    /// Explicit refresh: scanned as soon as the loop picks it up.
    pub async fn refresh(&self) -> Result<()> {
        self.send(SessionCommand::Force(ScanReason::Refresh)).await
    }

    /// Debounced rescan request.
    pub async fn trigger(&self, reason: ScanReason) -> Result<()> {
        self.send(SessionCommand::Trigger(reason)).await
    }

    pub async fn navigated(&self) -> Result<()> {
        self.inner.engine.lock().await.navigated();
        self.send(SessionCommand::Trigger(ScanReason::Navigation)).await
    }

    /// Returns whether fresh content reached the panel.
    pub async fn hover(&self, element: ElementId) -> bool {
        let ticket = self.inner.engine.lock().await.hover(element);
        self.run_fetch(ticket).await
    }

    pub async fn select_file(&self, path: &str) -> bool {
        let ticket = self.inner.engine.lock().await.select_file(path);
        self.run_fetch(ticket).await
    }

    /// Apply a host message; a toggle also arms or cancels pending scans.
    pub async fn handle_message(&self, raw: &str) -> Result<Option<bool>> {
        let enabled = self.inner.engine.lock().await.handle_message(raw);
        match enabled {
            Some(true) => self.send(SessionCommand::ArmRetries).await?,
            Some(false) => self.send(SessionCommand::Cancel).await?,
            None => {}
        }
        Ok(enabled)
    }

    async fn run_fetch(&self, ticket: Option<FetchTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };
        let result = self.inner.fetcher.fetch_source(&ticket.path).await;
        self.inner.engine.lock().await.complete_fetch(&ticket, result)
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|_| LensError::Io(std::io::Error::other("rescan loop stopped")))
    }
}

impl<D: Document + Send + 'static> Drop for LensSession<D> {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(SessionCommand::Shutdown);
        }
    }
}

fn spawn_rescan_loop<D: Document + Send + 'static>(
    engine: Arc<TokioMutex<Engine<D>>>,
    config: ScanScheduleConfig,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    update_tx: broadcast::Sender<ScanUpdate>,
) {
    tokio::spawn(async move {
        let mut schedule = ScanSchedule::new(config);

        loop {
            let next_deadline = schedule.next_deadline();

            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Trigger(reason)) => {
                            schedule.trigger(reason, Instant::now());
                        }
                        Some(SessionCommand::Force(reason)) => {
                            schedule.force(reason, Instant::now());
                        }
                        Some(SessionCommand::ArmRetries) => {
                            schedule.arm_initial_retries(Instant::now());
                        }
                        Some(SessionCommand::Cancel) => schedule.cancel(),
                        Some(SessionCommand::Shutdown) | None => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if next_deadline.is_some() => {
                    let Some(reason) = schedule.take_due(Instant::now()) else {
                        continue;
                    };
                    let mut engine = engine.lock().await;
                    let outcome = engine.rescan(reason.clone());
                    let update = ScanUpdate {
                        reason,
                        changed: outcome == ScanOutcome::Changed,
                        rebuild_count: engine.rebuild_count(),
                        files: engine.context().file_tree.file_count(),
                    };
                    drop(engine);
                    let _ = update_tx.send(update);
                }
            }
        }
        log::debug!("Rescan loop stopped");
    });
}

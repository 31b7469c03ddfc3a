//! Debounced change detection and context extraction.
//!
//! A `ContentChangeDetector` owns one worker task. Edit events are sent to the
//! worker over a channel, debounced there, and on each fire the worker runs
//! the segment → locate → window pipeline, records a snapshot and broadcasts
//! the `ExtractionResult` to every subscriber.
//!
//! All detector state (debounce timer, history) lives on the worker task, so
//! a `cancel` processed before the deadline always wins against the timer.

use crate::config::DetectionConfig;
use crate::cursor::locate;
use crate::debouncer::ChangeDebouncer;
use crate::history::ContentHistory;
use crate::segmenter::segment;
use crate::types::{ContentSnapshot, DetectorError, DetectorState, EditEvent, ExtractionResult};
use crate::window::build_window;
use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

/// Run the extraction pipeline on one piece of content
///
/// An empty document yields a result with no paragraphs and no focus.
pub fn extract(content: &str, cursor_offset: usize, context_radius: usize) -> ExtractionResult {
    let timestamp = Utc::now();
    let paragraphs = segment(content);
    if paragraphs.is_empty() {
        return ExtractionResult::empty(timestamp);
    }

    let focus_index = locate(&paragraphs, cursor_offset);
    let context_paragraphs = build_window(&paragraphs, focus_index, context_radius).to_vec();

    ExtractionResult {
        total_paragraphs: paragraphs.len(),
        paragraphs,
        focus_index: Some(focus_index),
        context_paragraphs,
        timestamp,
    }
}

enum Command {
    Edit(EditEvent),
    Cancel,
    History(oneshot::Sender<Vec<ContentSnapshot>>),
    Shutdown,
}

/// Debounced content change detector
///
/// Must be created inside a Tokio runtime. Dropping the detector cancels any
/// pending fire, detaches attached sources and stops the worker.
pub struct ContentChangeDetector {
    config: DetectionConfig,
    runtime: Handle,
    command_tx: mpsc::UnboundedSender<Command>,
    result_tx: broadcast::WeakSender<ExtractionResult>,
    state_rx: watch::Receiver<DetectorState>,
    shutdown_tx: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
}

impl ContentChangeDetector {
    /// Validate the config and start the worker task
    ///
    /// Fails with `TimerUnavailable` when called outside a Tokio runtime or
    /// on a runtime built without the time driver.
    pub fn spawn(config: DetectionConfig) -> Result<Self, DetectorError> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| DetectorError::TimerUnavailable(e.to_string()))?;
        ensure_timer(&runtime)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (result_tx, _) = broadcast::channel(config.result_buffer);
        let (state_tx, state_rx) = watch::channel(DetectorState::Idle);
        let (shutdown_tx, _) = watch::channel(false);

        // Only the worker holds a strong sender
        let weak_result_tx = result_tx.downgrade();
        let worker = runtime.spawn(run_worker(config.clone(), command_rx, result_tx, state_tx));

        debug!(
            "Detector started (debounce: {}ms, radius: {}, history: {})",
            config.debounce_delay_ms, config.context_radius, config.history_capacity
        );

        Ok(Self {
            config,
            runtime,
            command_tx,
            result_tx: weak_result_tx,
            state_rx,
            shutdown_tx,
            worker: Some(worker),
        })
    }

    /// Start a detector with default settings
    pub fn with_defaults() -> Result<Self, DetectorError> {
        Self::spawn(DetectionConfig::default())
    }

    /// Feed a raw edit event
    ///
    /// Invalid events are rejected here and never reach the debouncer.
    pub fn notify_edit(&self, event: EditEvent) -> Result<(), DetectorError> {
        event.validate()?;
        self.command_tx
            .send(Command::Edit(event))
            .map_err(|_| DetectorError::Closed)
    }

    /// Abort the pending fire, if any
    pub fn cancel(&self) -> Result<(), DetectorError> {
        self.command_tx
            .send(Command::Cancel)
            .map_err(|_| DetectorError::Closed)
    }

    /// Receive every future extraction result. Drop the receiver to unsubscribe.
    ///
    /// Once the worker has stopped the receiver is already closed.
    pub fn subscribe(&self) -> broadcast::Receiver<ExtractionResult> {
        match self.result_tx.upgrade() {
            Some(result_tx) => result_tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Forward edits from an upstream source until the handle is dropped,
    /// the source closes, or the detector shuts down
    ///
    /// There is no caller to return an error to here: events that fail
    /// validation are logged at `warn` and skipped. Use `notify_edit` directly
    /// to get `InvalidInput` back.
    pub fn attach(&self, mut events: mpsc::Receiver<EditEvent>) -> SourceHandle {
        let command_tx = self.command_tx.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            if let Err(e) = event.validate() {
                                warn!("Dropping edit from attached source: {}", e);
                                continue;
                            }
                            if command_tx.send(Command::Edit(event)).is_err() {
                                break;
                            }
                        }
                        None => {
                            debug!("Attached edit source closed");
                            break;
                        }
                    }
                }
            }
        });

        SourceHandle { task }
    }

    /// Copy of the recorded snapshots, oldest first
    pub async fn history(&self) -> Result<Vec<ContentSnapshot>, DetectorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::History(reply_tx))
            .map_err(|_| DetectorError::Closed)?;
        reply_rx.await.map_err(|_| DetectorError::Closed)
    }

    pub fn state(&self) -> DetectorState {
        *self.state_rx.borrow()
    }

    /// Watch state transitions
    ///
    /// `Extracting` only lasts while the pipeline runs on the worker, which
    /// does not yield in between. Watchers usually see `Pending` go straight
    /// to `Idle`; `changed()` coalesces intermediate values.
    pub fn state_stream(&self) -> watch::Receiver<DetectorState> {
        self.state_rx.clone()
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
        info!("Detector shut down");
    }
}

impl Drop for ContentChangeDetector {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Fail early if the current runtime cannot drive timers
///
/// Tokio panics on creating a `sleep` when the time driver is disabled.
fn ensure_timer(runtime: &Handle) -> Result<(), DetectorError> {
    let _guard = runtime.enter();
    panic::catch_unwind(AssertUnwindSafe(|| drop(time::sleep(Duration::ZERO)))).map_err(|_| {
        DetectorError::TimerUnavailable("the Tokio runtime has timers disabled".to_string())
    })
}

/// Disposer for an attached edit source
pub struct SourceHandle {
    task: JoinHandle<()>,
}

impl SourceHandle {
    /// Stop forwarding edits
    pub fn detach(self) {
        // Drop does the work
    }

    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_worker(
    config: DetectionConfig,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    result_tx: broadcast::Sender<ExtractionResult>,
    state_tx: watch::Sender<DetectorState>,
) {
    let mut debouncer = ChangeDebouncer::new(config.debounce_delay());
    let mut history = ContentHistory::new(config.history_capacity);

    loop {
        let deadline = debouncer.deadline();

        tokio::select! {
            biased;

            command = command_rx.recv() => match command {
                Some(Command::Edit(event)) => {
                    trace!(
                        "Edit received: {} bytes, cursor {}",
                        event.content.len(),
                        event.cursor_offset
                    );
                    debouncer.notify(event);
                    state_tx.send_replace(DetectorState::Pending);
                }
                Some(Command::Cancel) => {
                    if debouncer.cancel() {
                        debug!("Pending extraction cancelled");
                    }
                    state_tx.send_replace(DetectorState::Idle);
                }
                Some(Command::History(reply)) => {
                    let _ = reply.send(history.to_vec());
                }
                Some(Command::Shutdown) | None => {
                    debouncer.cancel();
                    break;
                }
            },

            () = async {
                if let Some(deadline) = deadline {
                    time::sleep_until(deadline).await;
                }
            }, if deadline.is_some() => {
                let Some(event) = debouncer.poll_fire(Instant::now()) else {
                    continue;
                };

                state_tx.send_replace(DetectorState::Extracting);
                let result = extract(&event.content, event.cursor(), config.context_radius);
                history.record(ContentSnapshot::capture(&event.content, result.timestamp));

                debug!(
                    "Extracted {} paragraphs (focus: {:?}, context: {})",
                    result.total_paragraphs,
                    result.focus_index,
                    result.context_paragraphs.len()
                );

                // No subscribers is not an error
                let _ = result_tx.send(result);
                state_tx.send_replace(DetectorState::Idle);
            }
        }
    }

    state_tx.send_replace(DetectorState::Idle);
    trace!("Detector worker exiting");
}

use std::future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::emitter::ResultEmitter;
use super::scheduler::BatchScheduler;
use super::state::{SessionState, StateEvent};
use super::stats::SessionStats;
use crate::audio::{AudioFragment, SessionBuffer};
use crate::error::{SessionError, TranscriptionError};
use crate::stt::{BatchJob, SpeechToText, TranscriptResult, TranscriptionInvoker};

type BatchOutcome = Result<Option<TranscriptResult>, TranscriptionError>;

enum Command {
    Fragment(AudioFragment),
    DecodeFailed,
    Finalize(oneshot::Sender<()>),
    Close,
}

/// Cloneable handle to a running [`TranscriptionSession`]
///
/// Every operation is a message to the session task, so callers never block
/// on buffering. Only [`finalize`](Self::finalize) waits for the backend.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    commands: mpsc::UnboundedSender<Command>,
    stats: watch::Receiver<SessionStats>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Buffer a decoded fragment; returns as soon as it is queued
    pub fn push_fragment(&self, fragment: AudioFragment) -> Result<(), SessionError> {
        self.send(Command::Fragment(fragment))
    }

    /// Count a fragment the connection could not decode
    pub fn record_decode_error(&self) {
        let _ = self.send(Command::DecodeFailed);
    }

    /// Request the final transcript
    ///
    /// Resolves after any in-flight batch has completed and the final batch
    /// over the whole session's audio has been transcribed and emitted.
    pub async fn finalize(&self) -> Result<(), SessionError> {
        self.request_finalize()?
            .await
            .map_err(|_| SessionError::Closed(self.id.clone()))
    }

    /// Queue a finalize behind everything already sent, without waiting
    ///
    /// The receiver resolves once the final batch has been emitted. Anything
    /// sent on this handle afterwards is handled after the finalize.
    pub fn request_finalize(&self) -> Result<oneshot::Receiver<()>, SessionError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Command::Finalize(done_tx))?;
        Ok(done_rx)
    }

    /// Tear the session down; safe to call more than once
    pub fn close(&self) {
        let _ = self.send(Command::Close);
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.stats.borrow().state
    }

    fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Closed(self.id.clone()))
    }
}

/// One live transcription session, bound to one connection
///
/// Runs as a single task: fragment arrival, timer expiry, batch completion,
/// finalize and close are all handled by its event loop, so buffer and state
/// are never touched concurrently and at most one backend call is in flight.
pub struct TranscriptionSession {
    id: String,
    state: SessionState,
    buffer: SessionBuffer,
    scheduler: BatchScheduler,
    invoker: TranscriptionInvoker,
    emitter: ResultEmitter,
    in_flight: Option<JoinHandle<BatchOutcome>>,
    stats: watch::Sender<SessionStats>,
    last_sequence: Option<u64>,
}

impl TranscriptionSession {
    /// Start a session task
    ///
    /// The returned join handle resolves to the final statistics once the
    /// session has been closed.
    pub fn spawn(
        id: String,
        config: SessionConfig,
        backend: Arc<dyn SpeechToText>,
        emitter: ResultEmitter,
    ) -> (SessionHandle, JoinHandle<SessionStats>) {
        info!(
            "Creating transcription session: {} (batch delay {:?}, language {})",
            id, config.batch_delay, config.language
        );

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (stats_tx, stats_rx) = watch::channel(SessionStats::new(id.clone()));

        let session = Self {
            id: id.clone(),
            state: SessionState::Open,
            buffer: SessionBuffer::new(),
            scheduler: BatchScheduler::new(config.batch_delay),
            invoker: TranscriptionInvoker::new(backend, config.language),
            emitter,
            in_flight: None,
            stats: stats_tx,
            last_sequence: None,
        };

        let task = tokio::spawn(session.run(commands_rx));

        let handle = SessionHandle {
            id,
            commands: commands_tx,
            stats: stats_rx,
        };

        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> SessionStats {
        info!("[{}] Session started", self.id);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Fragment(fragment)) => self.on_fragment(fragment),
                    Some(Command::DecodeFailed) => {
                        self.stats.send_modify(|s| s.decode_errors += 1);
                    }
                    Some(Command::Finalize(done)) => {
                        self.finalize().await;
                        let _ = done.send(());
                    }
                    Some(Command::Close) | None => {
                        self.close();
                        break;
                    }
                },
                _ = self.scheduler.expired() => self.on_timer_expired(),
                outcome = join_batch(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.on_batch_completed(outcome);
                }
            }
        }

        let stats = self.stats.borrow().snapshot();
        info!(
            "[{}] Session ended: {} fragments, {} batches ({} failed), {} results",
            self.id,
            stats.fragments_received,
            stats.batches_dispatched,
            stats.batches_failed,
            stats.results_emitted
        );
        stats
    }

    fn on_fragment(&mut self, fragment: AudioFragment) {
        let sequence = fragment.sequence_number();

        if !self.state.accepts_fragments() {
            warn!(
                "[{}] Rejecting chunk {} in state {}",
                self.id, sequence, self.state
            );
            self.emitter.emit_error(format!(
                "Session is {}; audio chunk {} rejected",
                self.state, sequence
            ));
            return;
        }

        if let Some(last) = self.last_sequence {
            if sequence <= last {
                warn!(
                    "[{}] Chunk {} arrived after chunk {} (accepted as-is)",
                    self.id, sequence, last
                );
            }
        }
        self.last_sequence = Some(sequence);

        let bytes = fragment.len();
        let received_at = fragment.received_at();
        self.buffer.append(fragment);
        self.stats.send_modify(|s| {
            s.fragments_received += 1;
            s.bytes_received += bytes;
            s.last_fragment_at = Some(received_at);
        });

        self.apply(StateEvent::FragmentArrived);
        if self.scheduler.on_fragment_arrived(self.in_flight.is_some()) {
            debug!(
                "[{}] Batch timer armed ({:?})",
                self.id,
                self.scheduler.delay()
            );
        }
    }

    fn on_timer_expired(&mut self) {
        if self.in_flight.is_some() || self.buffer.is_pending_empty() {
            debug!("[{}] Timer expired with nothing to dispatch", self.id);
            return;
        }

        let job = BatchJob::timer(self.buffer.drain_pending());
        self.in_flight = Some(self.spawn_batch(job));
    }

    fn on_batch_completed(&mut self, outcome: BatchOutcome) {
        self.deliver(outcome);

        let pending = !self.buffer.is_pending_empty();
        self.apply(StateEvent::BatchCompleted { pending });
        if self.state == SessionState::Batching && self.scheduler.rearm_after_batch(pending) {
            debug!(
                "[{}] {} fragments arrived during batch, timer re-armed",
                self.id,
                self.buffer.pending_len()
            );
        }
    }

    async fn finalize(&mut self) {
        if !matches!(self.state, SessionState::Open | SessionState::Batching) {
            warn!("[{}] Finalize requested in state {}", self.id, self.state);
            self.emitter
                .emit_error(format!("Session is {}; finalize ignored", self.state));
            return;
        }

        info!("[{}] Finalizing session", self.id);
        self.apply(StateEvent::FinalizeRequested);
        self.scheduler.cancel();

        if let Some(batch) = self.in_flight.take() {
            debug!("[{}] Waiting for in-flight batch", self.id);
            let outcome = join_detached(batch).await;
            self.deliver(outcome);
            let pending = !self.buffer.is_pending_empty();
            self.apply(StateEvent::BatchCompleted { pending });
        }

        let fragments = self.buffer.snapshot_cumulative();
        if fragments.is_empty() {
            info!("[{}] No audio received, nothing to finalize", self.id);
        } else {
            let batch = self.spawn_batch(BatchJob::finalize(fragments));
            let outcome = join_detached(batch).await;
            self.deliver(outcome);
        }

        self.buffer.reset();
        self.apply(StateEvent::FinalCompleted);
    }

    fn close(&mut self) {
        self.scheduler.cancel();
        if self.in_flight.take().is_some() {
            info!(
                "[{}] Connection closed with a batch in flight; its result will be discarded",
                self.id
            );
        }
        self.buffer.reset();
        self.apply(StateEvent::TransportClosed);
    }

    /// Run one backend call on its own task
    ///
    /// The call is never aborted: dropping the handle detaches it and its
    /// result is discarded.
    fn spawn_batch(&mut self, job: BatchJob) -> JoinHandle<BatchOutcome> {
        self.stats.send_modify(|s| s.batches_dispatched += 1);
        let invoker = self.invoker.clone();
        tokio::spawn(async move { invoker.invoke(&job).await })
    }

    fn deliver(&mut self, outcome: BatchOutcome) {
        match outcome {
            Ok(Some(result)) => {
                info!(
                    "[{}] Transcript (final={}): {}",
                    self.id, result.is_final, result.text
                );
                self.stats.send_modify(|s| s.results_emitted += 1);
                self.emitter.emit_result(result);
            }
            Ok(None) => {
                debug!("[{}] Batch produced no speech", self.id);
            }
            Err(e) => {
                // Fragments of a failed batch are not re-queued
                error!("[{}] Batch failed: {}", self.id, e);
                self.stats.send_modify(|s| s.batches_failed += 1);
                self.emitter.emit_error(e.to_string());
            }
        }
    }

    fn apply(&mut self, event: StateEvent) {
        match self.state.transition(event) {
            Ok(next) => {
                if next != self.state {
                    debug!("[{}] {} -> {}", self.id, self.state, next);
                }
                self.state = next;
                self.stats.send_modify(|s| s.state = next);
            }
            Err(e) => warn!("[{}] {}", self.id, e),
        }
    }
}

async fn join_batch(slot: &mut Option<JoinHandle<BatchOutcome>>) -> BatchOutcome {
    match slot.as_mut() {
        Some(batch) => batch
            .await
            .unwrap_or_else(|e| Err(TranscriptionError::Aborted(e.to_string()))),
        None => future::pending().await,
    }
}

async fn join_detached(batch: JoinHandle<BatchOutcome>) -> BatchOutcome {
    batch
        .await
        .unwrap_or_else(|e| Err(TranscriptionError::Aborted(e.to_string())))
}

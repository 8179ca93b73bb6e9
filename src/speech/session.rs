use super::config::SpeechConfig;
use super::engine::{EngineError, EngineEvent, ErrorKind, Hypothesis, SpeechEngine};
use super::stats::SessionStats;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Delay between the engine ending capture on its own and our restart
/// attempt, so a burst of contradictory end/error events can settle.
const RESTART_DEBOUNCE: Duration = Duration::from_millis(100);

/// Events surfaced to the session consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// New recognized text. Final text has been appended to the
    /// accumulated transcript; interim text replaced it.
    Transcript { text: String, is_final: bool },
    /// The engine session ended without the caller asking it to
    Ended,
    /// A non-recoverable or otherwise caller-relevant engine error
    Error(ErrorKind),
}

/// The session's mutable state, one cohesive record.
///
/// Event handlers and timer continuations trust only what they read
/// here under the lock; in particular `engine_active` is the shadow of
/// the public listening flag, updated synchronously where the public
/// flag's effect is not.
#[derive(Debug, Default)]
struct SessionState {
    /// Shadow listening flag, the only value event handlers may trust
    engine_active: bool,
    /// Set the instant a caller asks to stop; checked first by every
    /// restart path until the next explicit start
    stop_requested: bool,
    /// The caller stopped this session
    manually_stopped: bool,
    /// Anything stopped this session (caller, watchdog, fatal error)
    force_stopped: bool,
    /// Latest not-yet-final text, replaced wholesale per result event
    interim_transcript: String,
    /// Finalized text, append-only until reset
    final_transcript: String,
    /// Silence watchdog, rearmed on every result event
    inactivity_timer: Option<JoinHandle<()>>,
    /// Debounce before restarting after the engine ended capture
    restart_timer: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
    result_events: usize,
    restarts: usize,
}

impl SessionState {
    fn cancel_inactivity_timer(&mut self) {
        if let Some(timer) = self.inactivity_timer.take() {
            timer.abort();
        }
    }

    fn cancel_restart_timer(&mut self) {
        if let Some(timer) = self.restart_timer.take() {
            timer.abort();
        }
    }
}

struct SessionInner {
    config: SpeechConfig,
    supported: bool,
    /// Public listening flag; lock-free reads for callers
    listening: AtomicBool,
    state: Mutex<SessionState>,
    /// Lock order is always state, then engine
    engine: Option<Mutex<Box<dyn SpeechEngine>>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
}

/// Speech session controller
///
/// Owns the lifecycle of one continuous recognition session: it starts
/// and stops the engine, decides when the engine's self-initiated
/// "capture ended" may auto-restart, force-stops on silence, classifies
/// engine errors, and accumulates the transcript. Cheap to clone; all
/// clones share the same session.
#[derive(Clone)]
pub struct SpeechSession {
    inner: Arc<SessionInner>,
}

impl SpeechSession {
    /// Create a session over the given engine, or an unsupported one
    /// when no engine exists on this runtime.
    ///
    /// The returned receiver carries the session's consumer events;
    /// for an unsupported session it simply never yields.
    pub async fn new(
        engine: Option<Box<dyn SpeechEngine>>,
        config: SpeechConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let Some(mut engine) = engine else {
            info!("speech capability absent, session permanently unsupported");
            let inner = Arc::new(SessionInner {
                config,
                supported: false,
                listening: AtomicBool::new(false),
                state: Mutex::new(SessionState::default()),
                engine: None,
                events_tx,
                dispatch_task: Mutex::new(None),
            });
            return Ok((Self { inner }, events_rx));
        };

        let engine_rx = engine
            .open(&config.engine_options())
            .await
            .context("failed to open speech engine binding")?;

        info!("speech session bound to engine: {}", engine.name());

        let inner = Arc::new(SessionInner {
            config,
            supported: true,
            listening: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
            engine: Some(Mutex::new(engine)),
            events_tx,
            dispatch_task: Mutex::new(None),
        });

        let dispatch = tokio::spawn(Self::run_dispatch(Arc::clone(&inner), engine_rx));
        *inner.dispatch_task.lock().await = Some(dispatch);

        Ok((Self { inner }, events_rx))
    }

    /// Whether the runtime exposes a speech engine. Fixed for the
    /// lifetime of the session.
    pub fn is_supported(&self) -> bool {
        self.inner.supported
    }

    /// Whether the session is currently listening.
    pub fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    /// Latest interim (not-yet-final) transcript.
    pub async fn transcript(&self) -> String {
        self.inner.state.lock().await.interim_transcript.clone()
    }

    /// Finalized transcript accumulated since the last start or reset.
    pub async fn final_transcript(&self) -> String {
        self.inner.state.lock().await.final_transcript.clone()
    }

    /// Snapshot of session state for status reporting.
    pub async fn stats(&self) -> SessionStats {
        let state = self.inner.state.lock().await;
        let duration_secs = state
            .started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            supported: self.inner.supported,
            listening: self.is_listening(),
            started_at: state.started_at,
            duration_secs,
            result_events: state.result_events,
            restarts: state.restarts,
        }
    }

    /// Start listening.
    ///
    /// No-op when the capability is absent. Clears the stop guard,
    /// raises the listening flags, clears both transcripts, then starts
    /// the engine. A rejected start (e.g. capture already running) is
    /// recoverable: the flags are reverted and nothing is surfaced.
    pub async fn start_listening(&self) {
        if !self.inner.supported {
            debug!("start_listening ignored, speech capability absent");
            return;
        }
        let Some(engine) = &self.inner.engine else {
            return;
        };

        let mut state = self.inner.state.lock().await;
        state.stop_requested = false;
        state.engine_active = true;
        self.inner.listening.store(true, Ordering::SeqCst);
        state.manually_stopped = false;
        state.force_stopped = false;
        state.interim_transcript.clear();
        state.final_transcript.clear();
        state.started_at = Some(Utc::now());
        state.result_events = 0;
        state.restarts = 0;

        state.cancel_inactivity_timer();
        if self.inner.config.inactivity_timeout_ms > 0 {
            state.inactivity_timer = Some(Self::spawn_inactivity_timer(Arc::clone(&self.inner)));
        }

        info!("starting speech capture");

        let mut engine = engine.lock().await;
        if let Err(e) = engine.start().await {
            // Recoverable; converge the flags back and carry on.
            debug!("engine start rejected: {}", e);
            state.engine_active = false;
            self.inner.listening.store(false, Ordering::SeqCst);
            state.cancel_inactivity_timer();
        }
    }

    /// Stop listening.
    ///
    /// Idempotent, and synchronous in effect: every flag has converged
    /// and every timer is dead before this returns, whether or not the
    /// engine cooperates. The engine's own shutdown may trail behind;
    /// the stop guard keeps any of its late events from reviving the
    /// session.
    pub async fn stop_listening(&self) {
        if !self.inner.supported {
            return;
        }

        let mut state = self.inner.state.lock().await;
        // The guard every restart path checks; set before anything else.
        state.stop_requested = true;
        self.inner.listening.store(false, Ordering::SeqCst);
        state.engine_active = false;
        state.manually_stopped = true;
        state.force_stopped = true;
        state.cancel_inactivity_timer();
        state.cancel_restart_timer();

        info!("stopping speech capture");

        let Some(engine) = &self.inner.engine else {
            return;
        };
        let mut engine = engine.lock().await;
        if let Err(abort_err) = engine.abort().await {
            debug!("engine abort failed ({}), falling back to stop", abort_err);
            if let Err(stop_err) = engine.stop().await {
                // State already converged; the engine's opinion no
                // longer matters.
                warn!("engine stop also failed: {}", stop_err);
            }
        }
    }

    /// Clear both transcripts without touching listening state.
    pub async fn reset_transcript(&self) {
        let mut state = self.inner.state.lock().await;
        state.interim_transcript.clear();
        state.final_transcript.clear();
    }

    /// Release the session: cancel timers and stop dispatching engine
    /// events. Does not stop the engine itself.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock().await;
            state.cancel_inactivity_timer();
            state.cancel_restart_timer();
        }
        if let Some(task) = self.inner.dispatch_task.lock().await.take() {
            task.abort();
        }
        debug!("speech session shut down");
    }

    async fn run_dispatch(inner: Arc<SessionInner>, mut events: mpsc::Receiver<EngineEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::Result(hypotheses) => Self::on_result(&inner, hypotheses).await,
                EngineEvent::AudioEnded => Self::on_audio_ended(&inner).await,
                EngineEvent::Error(kind) => Self::on_error(&inner, kind).await,
                EngineEvent::Ended => Self::on_ended(&inner).await,
            }
        }
        debug!("engine event stream closed");
    }

    async fn on_result(inner: &Arc<SessionInner>, hypotheses: Vec<Hypothesis>) {
        let mut state = inner.state.lock().await;
        state.result_events += 1;

        // Speech arrived; push the silence watchdog out.
        state.cancel_inactivity_timer();
        if inner.config.inactivity_timeout_ms > 0 && state.engine_active {
            state.inactivity_timer = Some(Self::spawn_inactivity_timer(Arc::clone(inner)));
        }

        let mut final_text = String::new();
        let mut interim_text = String::new();
        for hyp in &hypotheses {
            if hyp.text.is_empty() {
                continue;
            }
            let target = if hyp.is_final { &mut final_text } else { &mut interim_text };
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(&hyp.text);
        }

        // Each side mutates only when this event carried text for it.
        if !final_text.is_empty() {
            if !state.final_transcript.is_empty() {
                state.final_transcript.push(' ');
            }
            state.final_transcript.push_str(&final_text);
            let _ = inner.events_tx.send(SessionEvent::Transcript {
                text: final_text,
                is_final: true,
            });
        }
        if !interim_text.is_empty() {
            state.interim_transcript = interim_text.clone();
            let _ = inner.events_tx.send(SessionEvent::Transcript {
                text: interim_text,
                is_final: false,
            });
        }
    }

    async fn on_audio_ended(inner: &Arc<SessionInner>) {
        let mut state = inner.state.lock().await;
        state.engine_active = false;

        if state.stop_requested {
            return;
        }
        if !inner.config.continuous || state.manually_stopped || state.force_stopped {
            return;
        }

        debug!("engine ended capture on its own, scheduling restart");
        state.cancel_restart_timer();
        state.restart_timer = Some(Self::spawn_restart_timer(Arc::clone(inner)));
    }

    async fn on_error(inner: &Arc<SessionInner>, kind: ErrorKind) {
        match kind {
            // Expected during normal stop/restart churn.
            ErrorKind::Aborted => {}
            // Genuine silence is the watchdog's business, not an error.
            ErrorKind::NoSpeech => {
                debug!("engine reported no speech");
            }
            kind => {
                if kind.is_fatal() {
                    // Not recoverable by restarting: force the session
                    // out of listening and keep the restart path shut.
                    let mut state = inner.state.lock().await;
                    state.engine_active = false;
                    state.force_stopped = true;
                    state.cancel_restart_timer();
                    set_not_listening(inner);
                }
                warn!("speech engine error: {}", kind);
                let _ = inner.events_tx.send(SessionEvent::Error(kind));
            }
        }
    }

    async fn on_ended(inner: &Arc<SessionInner>) {
        let mut state = inner.state.lock().await;
        state.engine_active = false;

        if !state.manually_stopped {
            let _ = inner.events_tx.send(SessionEvent::Ended);
        }
        if !inner.config.continuous || state.manually_stopped {
            set_not_listening(inner);
            // One-shot: the next start must not inherit this flag.
            state.manually_stopped = false;
        }
    }

    fn spawn_inactivity_timer(inner: Arc<SessionInner>) -> JoinHandle<()> {
        let timeout = Duration::from_millis(inner.config.inactivity_timeout_ms);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            Self::on_inactivity(&inner).await;
        })
    }

    /// Silence watchdog fired. Re-validate under the lock, then
    /// force-stop through the abort primitive alone; `stop_requested`
    /// stays untouched so the consumer is free to start again.
    async fn on_inactivity(inner: &Arc<SessionInner>) {
        let mut state = inner.state.lock().await;
        // This task is the timer; drop the handle without aborting it.
        state.inactivity_timer = None;

        // Conditions at schedule time mean nothing now.
        if state.stop_requested || !state.engine_active {
            return;
        }

        info!(
            "no speech for {}ms, stopping capture",
            inner.config.inactivity_timeout_ms
        );
        state.engine_active = false;
        state.force_stopped = true;
        state.cancel_restart_timer();
        set_not_listening(inner);

        if let Some(engine) = &inner.engine {
            let mut engine = engine.lock().await;
            if let Err(e) = engine.abort().await {
                warn!("engine abort after silence timeout failed: {}", e);
            }
        }
    }

    fn spawn_restart_timer(inner: Arc<SessionInner>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(RESTART_DEBOUNCE).await;
            Self::on_restart_due(&inner).await;
        })
    }

    /// Restart debounce fired. Every guard is re-checked here, at fire
    /// time: any of them may have flipped during the debounce window.
    async fn on_restart_due(inner: &Arc<SessionInner>) {
        let mut state = inner.state.lock().await;
        state.restart_timer = None;

        if state.stop_requested
            || state.manually_stopped
            || state.force_stopped
            || !inner.config.continuous
            || state.engine_active
        {
            return;
        }
        let Some(engine) = &inner.engine else {
            return;
        };

        state.engine_active = true;
        state.restarts += 1;
        debug!("restarting engine after self-initiated capture end");

        let mut engine = engine.lock().await;
        match engine.start().await {
            Ok(()) => {}
            Err(EngineError::AlreadyStarted) => {
                debug!("engine already capturing, restart skipped");
            }
            Err(e) => {
                warn!("engine restart failed: {}", e);
                state.engine_active = false;
                set_not_listening(inner);
            }
        }
    }
}

fn set_not_listening(inner: &SessionInner) {
    inner.listening.store(false, Ordering::SeqCst);
}

use super::engine::{EngineError, EngineEvent, EngineOptions, ErrorKind, Hypothesis, SpeechEngine};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// One scripted step: wait, then emit.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayStep {
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(flatten)]
    pub event: ReplayEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Result { hypotheses: Vec<Hypothesis> },
    AudioEnded,
    Error { code: String },
    Ended,
}

impl ReplayEvent {
    fn to_engine_event(&self) -> EngineEvent {
        match self {
            ReplayEvent::Result { hypotheses } => EngineEvent::Result(hypotheses.clone()),
            ReplayEvent::AudioEnded => EngineEvent::AudioEnded,
            ReplayEvent::Error { code } => EngineEvent::Error(ErrorKind::from_code(code)),
            ReplayEvent::Ended => EngineEvent::Ended,
        }
    }
}

/// Engine that replays a scripted event file.
///
/// Lets the whole speech path run without a host recognizer: each
/// `start()` plays the script from the top with its per-step delays,
/// `abort()` cuts playback and ends the session the way a real engine
/// would. Script format: a JSON array of steps, e.g.
///
/// ```json
/// [
///   { "delay_ms": 500, "event": "result",
///     "hypotheses": [{ "text": "add milk", "is_final": true }] },
///   { "delay_ms": 200, "event": "audio_ended" },
///   { "event": "ended" }
/// ]
/// ```
pub struct ReplayEngine {
    path: PathBuf,
    script: Arc<Vec<ReplayStep>>,
    events_tx: Option<mpsc::Sender<EngineEvent>>,
    playback: Option<JoinHandle<()>>,
}

impl ReplayEngine {
    pub fn new(path: PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;
        let script: Vec<ReplayStep> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse replay script {}", path.display()))?;

        info!(
            "loaded replay script {} ({} steps)",
            path.display(),
            script.len()
        );

        Ok(Self {
            path,
            script: Arc::new(script),
            events_tx: None,
            playback: None,
        })
    }

    fn playback_running(&self) -> bool {
        self.playback.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop playback and emit the trailing `Ended`, as a host engine
    /// does when told to stop mid-session.
    async fn end_playback(&mut self) {
        if let Some(task) = self.playback.take() {
            task.abort();
        }
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(EngineEvent::Ended).await;
        }
    }
}

#[async_trait::async_trait]
impl SpeechEngine for ReplayEngine {
    async fn open(
        &mut self,
        _options: &EngineOptions,
    ) -> Result<mpsc::Receiver<EngineEvent>, EngineError> {
        if self.events_tx.is_some() {
            return Err(EngineError::AlreadyBound);
        }
        let (tx, rx) = mpsc::channel(64);
        self.events_tx = Some(tx);
        Ok(rx)
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        let Some(tx) = self.events_tx.clone() else {
            return Err(EngineError::Unavailable("binding not opened".to_string()));
        };
        if self.playback_running() {
            return Err(EngineError::AlreadyStarted);
        }

        debug!("replaying {}", self.path.display());
        let script = Arc::clone(&self.script);
        self.playback = Some(tokio::spawn(async move {
            for step in script.iter() {
                if step.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
                }
                if tx.send(step.event.to_engine_event()).await.is_err() {
                    return;
                }
            }
        }));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.end_playback().await;
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), EngineError> {
        self.end_playback().await;
        Ok(())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

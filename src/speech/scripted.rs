use super::engine::{EngineError, EngineEvent, EngineOptions, SpeechEngine};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One invocation of an engine primitive, as seen by the fake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Open,
    Start,
    Stop,
    Abort,
}

#[derive(Default)]
struct ScriptedShared {
    calls: Mutex<Vec<EngineCall>>,
    next_start_failure: Mutex<Option<EngineError>>,
}

impl ScriptedShared {
    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }
}

/// A speech engine that does only what its test script tells it to.
///
/// The session under test drives the primitives; the test drives the
/// event stream through the paired [`ScriptedHandle`] and then asserts
/// on the recorded primitive calls.
pub struct ScriptedEngine {
    events_rx: Option<mpsc::Receiver<EngineEvent>>,
    shared: Arc<ScriptedShared>,
}

/// The test's side of a [`ScriptedEngine`].
#[derive(Clone)]
pub struct ScriptedHandle {
    events_tx: mpsc::Sender<EngineEvent>,
    shared: Arc<ScriptedShared>,
}

impl ScriptedEngine {
    pub fn new() -> (Self, ScriptedHandle) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let shared = Arc::new(ScriptedShared::default());
        (
            Self {
                events_rx: Some(events_rx),
                shared: Arc::clone(&shared),
            },
            ScriptedHandle { events_tx, shared },
        )
    }
}

#[async_trait::async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn open(
        &mut self,
        _options: &EngineOptions,
    ) -> Result<mpsc::Receiver<EngineEvent>, EngineError> {
        self.shared.record(EngineCall::Open);
        self.events_rx.take().ok_or(EngineError::AlreadyBound)
    }

    async fn start(&mut self) -> Result<(), EngineError> {
        self.shared.record(EngineCall::Start);
        let failure = self
            .shared
            .next_start_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.shared.record(EngineCall::Stop);
        Ok(())
    }

    async fn abort(&mut self) -> Result<(), EngineError> {
        self.shared.record(EngineCall::Abort);
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl ScriptedHandle {
    /// Fire an event at the session, as the engine would.
    pub async fn emit(&self, event: EngineEvent) {
        let _ = self.events_tx.send(event).await;
    }

    /// Make the next `start()` call fail with the given error.
    pub fn fail_next_start(&self, err: EngineError) {
        *self
            .shared
            .next_start_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(err);
    }

    /// All primitive calls recorded so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.shared
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// How many times the given primitive has been invoked.
    pub fn call_count(&self, call: EngineCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }
}

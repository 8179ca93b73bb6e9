use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::info;

/// Options bound into the engine when the session opens its binding.
///
/// Changing any of these means tearing the session down and building a
/// new one; the engine is not reconfigurable in place.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Keep listening across individual utterances instead of stopping
    /// after the first result
    pub continuous: bool,
    /// Emit not-yet-final hypotheses
    pub interim_results: bool,
    /// BCP 47 language tag (e.g. "en-US")
    pub language: String,
}

/// A single recognition hypothesis from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Recognized text
    pub text: String,
    /// Final results will not be revised by later events; interim ones may be
    pub is_final: bool,
    /// Confidence score (0.0 to 1.0), if the engine reports one
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// Events emitted by a speech engine over its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One or more new hypotheses, possibly mixing final and interim text
    Result(Vec<Hypothesis>),
    /// Audio capture stopped; continuous engines fire this between
    /// utterances and then decide on their own whether to come back
    AudioEnded,
    /// Engine-reported error, already mapped to a kind
    Error(ErrorKind),
    /// The recognition session itself ended
    Ended,
}

/// Engine error classification.
///
/// The codes mirror what host recognizers report on their error events.
/// Only the fatal kinds ever reach the session consumer; the rest are
/// churn the controller absorbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No speech detected in the current utterance window
    NoSpeech,
    /// Capture was aborted; expected during normal stop/restart churn
    Aborted,
    /// Microphone capture failed
    AudioCapture,
    /// Recognition service unreachable
    Network,
    /// Microphone permission denied
    NotAllowed,
    /// The recognition service refused this client
    ServiceNotAllowed,
    /// Requested language not supported
    LanguageNotSupported,
    /// Anything the engine reports that we do not know by name
    Other(String),
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => ErrorKind::NoSpeech,
            "aborted" => ErrorKind::Aborted,
            "audio-capture" => ErrorKind::AudioCapture,
            "network" => ErrorKind::Network,
            "not-allowed" => ErrorKind::NotAllowed,
            "service-not-allowed" => ErrorKind::ServiceNotAllowed,
            "language-not-supported" => ErrorKind::LanguageNotSupported,
            other => ErrorKind::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ErrorKind::NoSpeech => "no-speech",
            ErrorKind::Aborted => "aborted",
            ErrorKind::AudioCapture => "audio-capture",
            ErrorKind::Network => "network",
            ErrorKind::NotAllowed => "not-allowed",
            ErrorKind::ServiceNotAllowed => "service-not-allowed",
            ErrorKind::LanguageNotSupported => "language-not-supported",
            ErrorKind::Other(code) => code,
        }
    }

    /// Permission and connectivity failures cannot be fixed by
    /// restarting the engine; the session must go non-listening.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotAllowed | ErrorKind::ServiceNotAllowed | ErrorKind::Network
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failures from the engine's own primitives.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("recognition already started")]
    AlreadyStarted,

    #[error("recognition not active")]
    NotStarted,

    #[error("engine binding already opened")]
    AlreadyBound,

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// Speech recognition engine trait
///
/// Implementations wrap whatever recognizer the runtime provides. The
/// engine is an opaque event source: the session controller drives it
/// through the three primitives and reacts to the event stream.
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Bind the engine with the session options.
    ///
    /// Returns the channel receiver the engine will emit events on.
    /// Callable once per engine instance.
    async fn open(&mut self, options: &EngineOptions) -> Result<mpsc::Receiver<EngineEvent>, EngineError>;

    /// Begin audio capture. Fails with `AlreadyStarted` if capture is
    /// already running.
    async fn start(&mut self) -> Result<(), EngineError>;

    /// Graceful stop: process whatever audio is buffered, then end.
    async fn stop(&mut self) -> Result<(), EngineError>;

    /// Hard abort: discard buffered audio and end immediately.
    async fn abort(&mut self) -> Result<(), EngineError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Where recognition comes from.
#[derive(Debug, Clone)]
pub enum EngineSource {
    /// A recognizer provided by the host runtime
    Native,
    /// Replay a scripted event file (demos, batch processing)
    Replay(PathBuf),
}

/// Speech engine factory
pub struct SpeechEngineFactory;

impl SpeechEngineFactory {
    /// Probe for a usable engine.
    ///
    /// `Ok(None)` means the capability is absent on this runtime, a
    /// terminal state rather than an error. The session built on top
    /// will be permanently unsupported and the assistant degrades to
    /// typed input.
    pub fn create(source: EngineSource) -> Result<Option<Box<dyn SpeechEngine>>> {
        match source {
            EngineSource::Native => {
                // Recognition is host-provided; this build ships no
                // in-process recognizer.
                info!("no native speech engine on this runtime, voice input disabled");
                Ok(None)
            }

            EngineSource::Replay(path) => {
                let engine = super::replay::ReplayEngine::new(path)?;
                Ok(Some(Box::new(engine)))
            }
        }
    }
}

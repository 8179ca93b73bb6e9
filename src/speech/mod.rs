//! Speech session management
//!
//! This module owns the lifecycle of a continuous speech-recognition
//! session over an opaque, event-driven engine:
//! - Deterministic start/stop semantics regardless of engine timing
//! - Auto-restart suppression once a stop has been requested
//! - Silence watchdog that force-stops the engine
//! - Engine error classification (noise vs fatal)
//! - Interim/final transcript accumulation

mod config;
mod engine;
mod replay;
mod scripted;
mod session;
mod stats;

pub use config::SpeechConfig;
pub use engine::{
    EngineError, EngineEvent, EngineOptions, EngineSource, ErrorKind, Hypothesis, SpeechEngine,
    SpeechEngineFactory,
};
pub use replay::{ReplayEngine, ReplayEvent, ReplayStep};
pub use scripted::{EngineCall, ScriptedEngine, ScriptedHandle};
pub use session::{SessionEvent, SpeechSession};
pub use stats::SessionStats;

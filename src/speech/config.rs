use super::engine::EngineOptions;

/// Configuration for a speech session
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Keep listening across utterances; the controller restarts the
    /// engine after it ends capture on its own
    pub continuous: bool,

    /// Ask the engine for not-yet-final hypotheses
    pub interim_results: bool,

    /// Recognition language tag
    pub language: String,

    /// Force-stop after this much silence. 0 disables the watchdog.
    pub inactivity_timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
            inactivity_timeout_ms: 8000, // 8 seconds of silence
        }
    }
}

impl SpeechConfig {
    /// The subset of options the engine binding cares about.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            continuous: self.continuous,
            interim_results: self.interim_results,
            language: self.language.clone(),
        }
    }
}

use crate::recipe::RecipeConfig;
use crate::speech::{EngineSource, SpeechConfig};
use anyhow::{bail, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recipe: RecipeConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,

    /// Bearer token required on API routes; open when unset
    #[serde(default)]
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct SpeechSettings {
    /// "native" (host recognizer) or "replay" (scripted event file)
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Event script for the replay engine
    #[serde(default)]
    pub replay_script: Option<String>,

    #[serde(default = "default_true")]
    pub continuous: bool,

    #[serde(default = "default_true")]
    pub interim_results: bool,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
}

fn default_engine() -> String {
    "native".to_string()
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_inactivity_timeout_ms() -> u64 {
    8000
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            replay_script: None,
            continuous: true,
            interim_results: true,
            language: default_language(),
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
        }
    }
}

impl SpeechSettings {
    pub fn session_config(&self) -> SpeechConfig {
        SpeechConfig {
            continuous: self.continuous,
            interim_results: self.interim_results,
            language: self.language.clone(),
            inactivity_timeout_ms: self.inactivity_timeout_ms,
        }
    }

    pub fn engine_source(&self) -> Result<EngineSource> {
        match self.engine.as_str() {
            "native" => Ok(EngineSource::Native),
            "replay" => match &self.replay_script {
                Some(path) => Ok(EngineSource::Replay(path.into())),
                None => bail!("speech.engine = \"replay\" requires speech.replay_script"),
            },
            other => bail!("unknown speech engine: {}", other),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Where list collections are persisted
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

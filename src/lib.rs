pub mod assistant;
pub mod config;
pub mod http;
pub mod list;
pub mod recipe;
pub mod speech;

pub use config::Config;
pub use http::{create_router, AppState};
pub use list::{
    categorize, parse, Category, HistoryEntry, ListProgress, ListStore, SavedRecipe, ShoppingItem,
    VoiceCommand,
};
pub use recipe::{GeneratedRecipe, RecipeConfig, RecipeGenerator};
pub use speech::{
    EngineCall, EngineError, EngineEvent, EngineOptions, EngineSource, ErrorKind, Hypothesis,
    ReplayEngine, ScriptedEngine, ScriptedHandle, SessionEvent, SessionStats, SpeechConfig,
    SpeechEngine, SpeechEngineFactory, SpeechSession,
};

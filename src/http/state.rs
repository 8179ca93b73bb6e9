use crate::list::ListStore;
use crate::recipe::RecipeGenerator;
use crate::speech::SpeechSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one speech session this process owns
    pub session: SpeechSession,

    /// Shopping list, history, and saved recipes
    pub store: Arc<ListStore>,

    /// Recipe-generation backend
    pub recipes: Arc<RecipeGenerator>,

    /// Bearer token required on API routes, when configured
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(
        session: SpeechSession,
        store: Arc<ListStore>,
        recipes: Arc<RecipeGenerator>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            session,
            store,
            recipes,
            api_token,
        }
    }
}

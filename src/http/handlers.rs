use super::state::AppState;
use crate::list::{ListProgress, SavedRecipe, ShoppingItem};
use crate::speech::SessionStats;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechStateResponse {
    pub supported: bool,
    pub listening: bool,
}

#[derive(Debug, Serialize)]
pub struct SpeechStatusResponse {
    #[serde(flatten)]
    pub stats: SessionStats,

    /// Latest interim hypothesis
    pub transcript: String,

    /// Finalized text accumulated this session
    pub final_transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub name: String,

    /// Defaults to 1
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    pub prefix: Option<String>,

    /// Defaults to 5
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRecipeRequest {
    /// Free-form dietary or style constraints
    pub constraints: Option<String>,

    /// Keep the generated recipe in the store (default: true)
    pub save: Option<bool>,
}

// ============================================================================
// Speech handlers
// ============================================================================

/// POST /speech/start
/// Start listening. A no-op without a speech engine; the response says so.
pub async fn speech_start(State(state): State<AppState>) -> impl IntoResponse {
    state.session.start_listening().await;
    Json(SpeechStateResponse {
        supported: state.session.is_supported(),
        listening: state.session.is_listening(),
    })
}

/// POST /speech/stop
/// Stop listening. Idempotent.
pub async fn speech_stop(State(state): State<AppState>) -> impl IntoResponse {
    state.session.stop_listening().await;
    Json(SpeechStateResponse {
        supported: state.session.is_supported(),
        listening: state.session.is_listening(),
    })
}

/// POST /speech/reset
/// Clear accumulated transcripts without touching listening state.
pub async fn speech_reset(State(state): State<AppState>) -> impl IntoResponse {
    state.session.reset_transcript().await;
    StatusCode::NO_CONTENT
}

/// GET /speech/status
pub async fn speech_status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.session.stats().await;
    let transcript = state.session.transcript().await;
    let final_transcript = state.session.final_transcript().await;
    Json(SpeechStatusResponse {
        stats,
        transcript,
        final_transcript,
    })
}

// ============================================================================
// List handlers
// ============================================================================

/// GET /list
pub async fn get_list(State(state): State<AppState>) -> Json<Vec<ShoppingItem>> {
    Json(state.store.items().await)
}

/// POST /list/items
pub async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "item name must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    match state
        .store
        .add_item(&req.name, req.quantity.unwrap_or(1))
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => {
            error!("failed to add item: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to add item: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// DELETE /list/items/:item_id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.remove_item(item_id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("item {} not found", item_id),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("failed to remove item: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to remove item: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /list/items/:item_id/toggle
pub async fn toggle_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.toggle_item(item_id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("item {} not found", item_id),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("failed to toggle item: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to toggle item: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// DELETE /list
pub async fn clear_list(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.clear().await {
        Ok(removed) => (StatusCode::OK, Json(ClearResponse { removed })).into_response(),
        Err(e) => {
            error!("failed to clear list: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to clear list: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// DELETE /list/completed
pub async fn clear_completed(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.clear_completed().await {
        Ok(removed) => (StatusCode::OK, Json(ClearResponse { removed })).into_response(),
        Err(e) => {
            error!("failed to clear completed items: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to clear completed items: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /list/progress
pub async fn get_progress(State(state): State<AppState>) -> Json<ListProgress> {
    Json(state.store.progress().await)
}

/// GET /list/suggestions?prefix=mi&limit=5
pub async fn get_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Json<Vec<String>> {
    let prefix = query.prefix.unwrap_or_default();
    let limit = query.limit.unwrap_or(5);
    Json(state.store.suggestions(&prefix, limit).await)
}

// ============================================================================
// Recipe handlers
// ============================================================================

/// GET /recipes
pub async fn get_recipes(State(state): State<AppState>) -> Json<Vec<SavedRecipe>> {
    Json(state.store.recipes().await)
}

/// POST /recipes/generate
/// Generate a recipe from the current list's items.
pub async fn generate_recipe(
    State(state): State<AppState>,
    Json(req): Json<GenerateRecipeRequest>,
) -> impl IntoResponse {
    let ingredients: Vec<String> = state
        .store
        .items()
        .await
        .into_iter()
        .map(|item| item.name)
        .collect();

    let generated = match state
        .recipes
        .generate(&ingredients, req.constraints.as_deref())
        .await
    {
        Ok(recipe) => recipe,
        Err(e) => {
            error!("recipe generation failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("recipe generation failed: {}", e),
                }),
            )
                .into_response();
        }
    };

    let recipe = SavedRecipe {
        id: Uuid::new_v4(),
        title: generated.title,
        ingredients: generated.ingredients,
        steps: generated.steps,
        created_at: Utc::now(),
    };

    if req.save.unwrap_or(true) {
        if let Err(e) = state.store.save_recipe(recipe.clone()).await {
            error!("failed to save recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("failed to save recipe: {}", e),
                }),
            )
                .into_response();
        }
        info!("saved recipe: {}", recipe.title);
    }

    (StatusCode::OK, Json(recipe)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

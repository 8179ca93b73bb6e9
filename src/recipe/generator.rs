use super::prompt::{build_prompt, parse_recipe, GeneratedRecipe, SYSTEM_PROMPT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the recipe-generation backend
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeConfig {
    /// Chat-completions endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token; without one, generation fails at call time
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Recipe generator backed by a chat-completion language model.
///
/// Prompt in, JSON recipe out; content quality is the model's problem,
/// the contract here is only the request/response shape.
pub struct RecipeGenerator {
    client: reqwest::Client,
    config: RecipeConfig,
}

impl RecipeGenerator {
    pub fn new(config: RecipeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Ask the model for one recipe over the given ingredients.
    pub async fn generate(
        &self,
        ingredients: &[String],
        constraints: Option<&str>,
    ) -> Result<GeneratedRecipe> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .context("recipe generation requires an API key")?;
        if ingredients.is_empty() {
            anyhow::bail!("cannot generate a recipe from an empty list");
        }

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(ingredients, constraints),
                },
            ],
            temperature: 0.7,
        };

        debug!(
            "requesting recipe for {} ingredients from {}",
            ingredients.len(),
            self.config.model
        );

        let response: ChatResponse = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("failed to reach recipe model")?
            .error_for_status()
            .context("recipe model rejected the request")?
            .json()
            .await
            .context("failed to parse recipe model response")?;

        let content = &response
            .choices
            .first()
            .context("recipe model returned no choices")?
            .message
            .content;

        let recipe = parse_recipe(content)?;
        info!("generated recipe: {}", recipe.title);
        Ok(recipe)
    }
}

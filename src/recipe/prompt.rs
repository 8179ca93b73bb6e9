use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A recipe as returned by the language model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

pub const SYSTEM_PROMPT: &str = "You are a cooking assistant. Given a list of \
grocery items, respond with one recipe that uses as many of them as possible. \
Respond with a single JSON object and nothing else, shaped as \
{\"title\": string, \"ingredients\": [string], \"steps\": [string]}. \
Assume a normally stocked kitchen for staples.";

/// Build the user message for a recipe request.
pub fn build_prompt(ingredients: &[String], constraints: Option<&str>) -> String {
    let mut prompt = format!(
        "Suggest a recipe using these grocery items: {}.",
        ingredients.join(", ")
    );
    if let Some(constraints) = constraints {
        let constraints = constraints.trim();
        if !constraints.is_empty() {
            prompt.push_str(&format!(" Constraints: {}.", constraints));
        }
    }
    prompt
}

/// Parse the model's reply into a recipe.
///
/// Models wrap JSON in fenced code blocks often enough that we strip
/// one if present before parsing.
pub fn parse_recipe(content: &str) -> Result<GeneratedRecipe> {
    let body = strip_code_fence(content.trim());
    let recipe: GeneratedRecipe =
        serde_json::from_str(body).context("model reply was not a JSON recipe")?;
    if recipe.title.trim().is_empty() {
        anyhow::bail!("model reply had an empty recipe title");
    }
    Ok(recipe)
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Opening fence may carry a language tag; drop that line.
    let rest = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest).trim()
}

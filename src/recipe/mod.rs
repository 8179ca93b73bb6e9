//! Recipe generation through a third-party language model
//!
//! Prompt construction, the chat-completion request/response contract,
//! and parsing of the model's JSON reply. Recipe quality is out of
//! scope; only the contract lives here.

mod generator;
mod prompt;

pub use generator::{RecipeConfig, RecipeGenerator};
pub use prompt::{build_prompt, parse_recipe, GeneratedRecipe, SYSTEM_PROMPT};

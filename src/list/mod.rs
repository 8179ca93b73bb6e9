//! Shopping list management
//!
//! This module provides the list the assistant builds and shops
//! against:
//! - Items with quantities, aisle categories, and checked-off state
//! - JSON-per-collection persistence, written through on mutation
//! - Item history feeding prefix suggestions
//! - Parsing of spoken sentences into list commands

mod commands;
mod item;
mod store;

pub use commands::{parse, VoiceCommand};
pub use item::{categorize, Category, HistoryEntry, ListProgress, ShoppingItem};
pub use store::{ListStore, SavedRecipe};

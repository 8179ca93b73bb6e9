use super::item::{HistoryEntry, ListProgress, ShoppingItem};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// A recipe kept alongside the list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRecipe {
    pub id: Uuid,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Persistent store for list items, item history, and saved recipes.
///
/// Each collection is one JSON document on disk, keyed by file name and
/// written through on every mutation: the get/set-by-key model the
/// assistant's clients use for local persistence, on the server side.
pub struct ListStore {
    data_dir: PathBuf,
    items: RwLock<Vec<ShoppingItem>>,
    history: RwLock<Vec<HistoryEntry>>,
    recipes: RwLock<Vec<SavedRecipe>>,
}

impl ListStore {
    /// Open the store, creating the data directory if needed and
    /// loading whatever collections already exist.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .context("failed to create data directory")?;

        let items: Vec<ShoppingItem> = load_collection(&data_dir.join("items.json")).await?;
        let history: Vec<HistoryEntry> = load_collection(&data_dir.join("history.json")).await?;
        let recipes: Vec<SavedRecipe> = load_collection(&data_dir.join("recipes.json")).await?;

        info!(
            "list store opened: {} items, {} history entries, {} recipes",
            items.len(),
            history.len(),
            recipes.len()
        );

        Ok(Self {
            data_dir,
            items: RwLock::new(items),
            history: RwLock::new(history),
            recipes: RwLock::new(recipes),
        })
    }

    /// Current list, in insertion order.
    pub async fn items(&self) -> Vec<ShoppingItem> {
        self.items.read().await.clone()
    }

    /// Add an item, merging into an existing un-checked item with the
    /// same name by bumping its quantity.
    pub async fn add_item(&self, name: &str, quantity: u32) -> Result<ShoppingItem> {
        let name = name.trim();
        let quantity = quantity.max(1);

        let item = {
            let mut items = self.items.write().await;
            let existing = items
                .iter_mut()
                .find(|i| !i.completed && i.name.eq_ignore_ascii_case(name));
            match existing {
                Some(existing) => {
                    existing.quantity += quantity;
                    debug!("merged {} into existing item {}", quantity, existing.name);
                    existing.clone()
                }
                None => {
                    let item = ShoppingItem::new(name, quantity);
                    items.push(item.clone());
                    item
                }
            }
        };
        self.persist_items().await?;

        {
            let mut history = self.history.write().await;
            match history
                .iter_mut()
                .find(|h| h.name.eq_ignore_ascii_case(name))
            {
                Some(entry) => {
                    entry.times_added += 1;
                    entry.last_added = Utc::now();
                }
                None => history.push(HistoryEntry {
                    name: name.to_string(),
                    times_added: 1,
                    last_added: Utc::now(),
                }),
            }
        }
        self.persist_history().await?;

        Ok(item)
    }

    /// Remove an item by id. Returns the removed item, if any.
    pub async fn remove_item(&self, id: Uuid) -> Result<Option<ShoppingItem>> {
        let removed = {
            let mut items = self.items.write().await;
            let pos = items.iter().position(|i| i.id == id);
            pos.map(|pos| items.remove(pos))
        };
        if removed.is_some() {
            self.persist_items().await?;
        }
        Ok(removed)
    }

    /// Remove the first item matching a spoken name.
    pub async fn remove_item_by_name(&self, name: &str) -> Result<Option<ShoppingItem>> {
        let removed = {
            let mut items = self.items.write().await;
            let pos = find_by_name(&items, name);
            pos.map(|pos| items.remove(pos))
        };
        if removed.is_some() {
            self.persist_items().await?;
        }
        Ok(removed)
    }

    /// Flip an item's checked-off state by id.
    pub async fn toggle_item(&self, id: Uuid) -> Result<Option<ShoppingItem>> {
        let toggled = {
            let mut items = self.items.write().await;
            items.iter_mut().find(|i| i.id == id).map(|item| {
                item.completed = !item.completed;
                item.clone()
            })
        };
        if toggled.is_some() {
            self.persist_items().await?;
        }
        Ok(toggled)
    }

    /// Check off the first item matching a spoken name.
    pub async fn complete_by_name(&self, name: &str) -> Result<Option<ShoppingItem>> {
        let completed = {
            let mut items = self.items.write().await;
            let pos = find_by_name(&items, name);
            pos.map(|pos| {
                items[pos].completed = true;
                items[pos].clone()
            })
        };
        if completed.is_some() {
            self.persist_items().await?;
        }
        Ok(completed)
    }

    /// Drop the whole list. Returns how many items were removed.
    pub async fn clear(&self) -> Result<usize> {
        let removed = {
            let mut items = self.items.write().await;
            let n = items.len();
            items.clear();
            n
        };
        self.persist_items().await?;
        Ok(removed)
    }

    /// Drop only checked-off items. Returns how many were removed.
    pub async fn clear_completed(&self) -> Result<usize> {
        let removed = {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|i| !i.completed);
            before - items.len()
        };
        self.persist_items().await?;
        Ok(removed)
    }

    /// Shopping progress over the current list.
    pub async fn progress(&self) -> ListProgress {
        let items = self.items.read().await;
        let completed = items.iter().filter(|i| i.completed).count();
        ListProgress::from_counts(items.len(), completed)
    }

    /// Previously-added names starting with `prefix`, most-added first.
    pub async fn suggestions(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        let history = self.history.read().await;
        let mut matches: Vec<&HistoryEntry> = history
            .iter()
            .filter(|h| h.name.to_lowercase().starts_with(&prefix))
            .collect();
        matches.sort_by(|a, b| b.times_added.cmp(&a.times_added));
        matches.into_iter().take(limit).map(|h| h.name.clone()).collect()
    }

    pub async fn save_recipe(&self, recipe: SavedRecipe) -> Result<SavedRecipe> {
        {
            let mut recipes = self.recipes.write().await;
            recipes.push(recipe.clone());
        }
        self.persist_recipes().await?;
        Ok(recipe)
    }

    pub async fn recipes(&self) -> Vec<SavedRecipe> {
        self.recipes.read().await.clone()
    }

    async fn persist_items(&self) -> Result<()> {
        let items = self.items.read().await;
        write_collection(&self.data_dir.join("items.json"), &*items).await
    }

    async fn persist_history(&self) -> Result<()> {
        let history = self.history.read().await;
        write_collection(&self.data_dir.join("history.json"), &*history).await
    }

    async fn persist_recipes(&self) -> Result<()> {
        let recipes = self.recipes.read().await;
        write_collection(&self.data_dir.join("recipes.json"), &*recipes).await
    }
}

/// Exact name match wins; otherwise the first item containing the
/// spoken words ("milk" finds "whole milk").
fn find_by_name(items: &[ShoppingItem], name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    items
        .iter()
        .position(|i| i.name.eq_ignore_ascii_case(name.trim()))
        .or_else(|| {
            items
                .iter()
                .position(|i| i.name.to_lowercase().contains(&wanted))
        })
}

async fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match tokio::fs::read(path).await {
        Ok(raw) => serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

async fn write_collection<T: Serialize>(path: &Path, value: &[T]) -> Result<()> {
    let raw = serde_json::to_vec_pretty(value).context("failed to serialize collection")?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

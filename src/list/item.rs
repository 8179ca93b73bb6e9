use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store aisle grouping for a shopping item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Produce,
    Dairy,
    Meat,
    Bakery,
    Pantry,
    Frozen,
    Beverages,
    Household,
    Other,
}

/// A single item on the shopping list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,

    /// Display name, as entered or spoken
    pub name: String,

    pub quantity: u32,

    /// Aisle grouping, guessed from the name
    pub category: Category,

    /// Checked off while shopping
    pub completed: bool,

    pub added_at: DateTime<Utc>,
}

impl ShoppingItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        let name = name.into();
        let category = categorize(&name);
        Self {
            id: Uuid::new_v4(),
            name,
            quantity: quantity.max(1),
            category,
            completed: false,
            added_at: Utc::now(),
        }
    }
}

/// Shopping progress against the current list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListProgress {
    pub total: usize,
    pub completed: usize,
    /// 0.0 to 1.0; 0.0 for an empty list
    pub fraction: f32,
}

impl ListProgress {
    pub fn from_counts(total: usize, completed: usize) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            completed as f32 / total as f32
        };
        Self {
            total,
            completed,
            fraction,
        }
    }
}

/// A previously-added item name, kept for suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub times_added: u32,
    pub last_added: DateTime<Utc>,
}

/// Guess the aisle from the item name.
///
/// Keyword matching against the dominant word is plenty here; anything
/// unrecognized lands in `Other` and the user never has to care.
pub fn categorize(name: &str) -> Category {
    let name = name.to_lowercase();
    let matches = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if matches(&[
        "apple", "banana", "orange", "lemon", "lime", "grape", "berry", "berries", "melon",
        "tomato", "potato", "onion", "garlic", "carrot", "lettuce", "spinach", "kale", "pepper",
        "cucumber", "broccoli", "avocado", "mushroom", "celery", "herb", "cilantro", "basil",
    ]) {
        Category::Produce
    } else if matches(&["milk", "cheese", "yogurt", "butter", "cream", "egg"]) {
        Category::Dairy
    } else if matches(&[
        "chicken", "beef", "pork", "turkey", "bacon", "sausage", "ham", "fish", "salmon", "shrimp",
        "steak",
    ]) {
        Category::Meat
    } else if matches(&["bread", "bagel", "bun", "roll", "tortilla", "croissant", "muffin"]) {
        Category::Bakery
    } else if matches(&["frozen", "ice cream", "pizza"]) {
        Category::Frozen
    } else if matches(&[
        "water", "juice", "soda", "coffee", "tea", "beer", "wine", "kombucha",
    ]) {
        Category::Beverages
    } else if matches(&[
        "paper towel", "toilet paper", "detergent", "soap", "shampoo", "sponge", "trash bag",
        "foil", "battery", "batteries",
    ]) {
        Category::Household
    } else if matches(&[
        "rice", "pasta", "flour", "sugar", "salt", "oil", "vinegar", "cereal", "beans", "lentil",
        "sauce", "soup", "spice", "honey", "peanut butter", "jam", "oats", "nuts", "crackers",
        "chips",
    ]) {
        Category::Pantry
    } else {
        Category::Other
    }
}

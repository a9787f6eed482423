//! Shopping list aggregation.
//!
//! Cart rows are merged per ingredient and summed. Ordering is the storage
//! collation's: callers pass rows sorted by ingredient name then id, and the
//! merged list keeps each ingredient at its first position. Rendering is a pure
//! text layout over that ordered list.

use std::collections::HashMap;

use foodgram_types::ShoppingListItem;
use rocket::serde::{Deserialize, Serialize};

/// One ingredient quantity of one recipe in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShoppingList {
    /// The cart holds no recipes, so there is nothing to aggregate.
    Empty,
    Items(Vec<ShoppingListItem>),
}

impl ShoppingList {
    pub fn into_items(self) -> Option<Vec<ShoppingListItem>> {
        match self {
            ShoppingList::Empty => None,
            ShoppingList::Items(items) => Some(items),
        }
    }
}

/// Merges `lines`, which must be ordered by ingredient name then id.
pub fn aggregate(lines: impl IntoIterator<Item = CartLine>) -> ShoppingList {
    let mut items: Vec<ShoppingListItem> = Vec::new();
    let mut positions: HashMap<i32, usize> = HashMap::new();
    for line in lines {
        let idx = *positions.entry(line.ingredient_id).or_insert_with(|| {
            items.push(ShoppingListItem {
                id: line.ingredient_id,
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: 0,
            });
            items.len() - 1
        });
        items[idx].amount += i64::from(line.amount);
    }

    if items.is_empty() {
        ShoppingList::Empty
    } else {
        ShoppingList::Items(items)
    }
}

/// Layout of the downloadable document, configured under `shopping_list`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(crate = "rocket::serde", default)]
pub struct RenderOptions {
    pub title: String,
    pub lines_per_page: usize,
    pub filename: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Shopping list".to_string(),
            lines_per_page: 40,
            filename: "shopping_list.txt".to_string(),
        }
    }
}

/// Renders items as plain text pages separated by a form feed.
pub fn render(items: &[ShoppingListItem], options: &RenderOptions) -> String {
    let per_page = options.lines_per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);

    let mut pages = Vec::with_capacity(total_pages);
    for (page_idx, chunk) in items.chunks(per_page).enumerate() {
        let mut page = format!(
            "{} (page {}/{})\n\n",
            options.title,
            page_idx + 1,
            total_pages
        );
        for (line_idx, item) in chunk.iter().enumerate() {
            page.push_str(&format!(
                "{}. {} ({}): {}\n",
                page_idx * per_page + line_idx + 1,
                item.name,
                item.measurement_unit,
                item.amount
            ));
        }
        pages.push(page);
    }
    pages.join("\u{c}")
}

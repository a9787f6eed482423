pub mod auth;
pub mod errors;
pub mod ingredient;
pub mod page;
pub mod recipe;
pub mod shopping;
pub mod tag;
pub mod user;

#[cfg(feature = "diesel")]
pub mod schema;

#[cfg(feature = "diesel")]
pub use schema::*;

// Re-export for convenience
pub use auth::{AuthToken, Login};
pub use errors::*;
pub use ingredient::{CreateIngredient, Ingredient};
pub use page::Page;
pub use recipe::{CreateRecipe, IngredientAmount, ModifyRecipe, Recipe, RecipeIngredient, RecipeSummary};
pub use shopping::ShoppingListItem;
pub use tag::{CreateTag, Tag};
pub use user::{Author, CreateUser, SetPassword, User};

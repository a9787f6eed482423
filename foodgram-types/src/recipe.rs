use serde::{Deserialize, Serialize};

use crate::tag::Tag;
use crate::user::User;

// API Response Types
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Recipe {
    pub id: i32,
    pub tags: Vec<Tag>,
    /// `None` once the author account has been removed.
    pub author: Option<User>,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    #[cfg_attr(feature = "utoipa", schema(format = DateTime, value_type=String))]
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: time::OffsetDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct RecipeIngredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Short form used by favorites, the cart and subscription previews.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

// API Request Types
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct IngredientAmount {
    /// Ingredient id
    pub id: i32,
    pub amount: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CreateRecipe {
    pub ingredients: Vec<IngredientAmount>,
    /// Tag ids
    pub tags: Vec<i32>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Ingredients and tags are always replaced; other fields are updated when present.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ModifyRecipe {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

use serde::{Deserialize, Serialize};

/// One aggregated line of a shopping list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ShoppingListItem {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

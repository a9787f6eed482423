use serde::{Deserialize, Serialize};

// API Response Types
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct Tag {
    pub id: i32,
    pub name: String,
    /// Hex color code, e.g. `#E26C2D`
    pub color: String,
    pub slug: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CreateTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

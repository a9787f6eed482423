use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use crate::utils::{DatabaseError, RelationError};
use foodgram_types::schema::favorites;

#[derive(Insertable, Debug)]
#[diesel(table_name = favorites)]
struct NewFavorite {
    user_id: i32,
    recipe_id: i32,
}

pub async fn add_favorite(
    conn: &mut Connection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), RelationError> {
    diesel::insert_into(favorites::table)
        .values(&NewFavorite { user_id, recipe_id })
        .execute(conn)
        .await
        .map_err(|e| RelationError::from_insert("favorite", e))?;
    Ok(())
}

pub async fn remove_favorite(
    conn: &mut Connection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), RelationError> {
    let deleted = diesel::delete(favorites::table.find((user_id, recipe_id)))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(RelationError::NotFound("favorite"));
    }
    Ok(())
}

/// Which of `recipe_ids` the user has favorited.
pub async fn favorited_among(
    conn: &mut Connection,
    user_id: i32,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DatabaseError> {
    let rows: Vec<i32> = favorites::table
        .filter(favorites::user_id.eq(user_id))
        .filter(favorites::recipe_id.eq_any(recipe_ids))
        .select(favorites::recipe_id)
        .load(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

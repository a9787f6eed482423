use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use super::user::User;
use crate::utils::{DatabaseError, RelationError};
use foodgram_types::schema::{subscriptions, users};

#[derive(Insertable, Debug)]
#[diesel(table_name = subscriptions)]
struct NewSubscription {
    user_id: i32,
    author_id: i32,
}

pub async fn subscribe(
    conn: &mut Connection,
    user_id: i32,
    author_id: i32,
) -> Result<(), RelationError> {
    if user_id == author_id {
        return Err(RelationError::SelfSubscription);
    }
    diesel::insert_into(subscriptions::table)
        .values(&NewSubscription { user_id, author_id })
        .execute(conn)
        .await
        .map_err(|e| RelationError::from_insert("subscription", e))?;
    Ok(())
}

pub async fn unsubscribe(
    conn: &mut Connection,
    user_id: i32,
    author_id: i32,
) -> Result<(), RelationError> {
    let deleted = diesel::delete(subscriptions::table.find((user_id, author_id)))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(RelationError::NotFound("subscription"));
    }
    Ok(())
}

/// Authors the user follows, ordered like the user listing.
pub async fn list_subscriptions(
    conn: &mut Connection,
    user_id: i32,
    offset: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), DatabaseError> {
    let followed = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .select(subscriptions::author_id);
    let count = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .count()
        .get_result(conn)
        .await?;
    let rows = users::table
        .filter(users::id.eq_any(followed))
        .select(User::as_select())
        .order_by((users::username.asc(), users::id.asc()))
        .offset(offset)
        .limit(limit)
        .load(conn)
        .await?;
    Ok((rows, count))
}

pub async fn subscribed_among(
    conn: &mut Connection,
    user_id: i32,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DatabaseError> {
    let rows: Vec<i32> = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use super::user::User;
use crate::utils::{password, DatabaseError};
use foodgram_types::schema::{auth_tokens, users};

#[derive(Insertable, Debug)]
#[diesel(table_name = auth_tokens)]
struct NewToken<'a> {
    token_hash: &'a str,
    user_id: i32,
}

/// Issues a new token for the user and returns it in raw form.
pub async fn create_token(conn: &mut Connection, user_id: i32) -> Result<String, DatabaseError> {
    let (raw, hash) = password::generate_token();
    diesel::insert_into(auth_tokens::table)
        .values(&NewToken {
            token_hash: &hash,
            user_id,
        })
        .execute(conn)
        .await?;
    Ok(raw)
}

pub async fn find_user_by_token(
    conn: &mut Connection,
    raw_token: &str,
) -> Result<Option<User>, DatabaseError> {
    let hash = password::hash_token(raw_token);
    Ok(auth_tokens::table
        .inner_join(users::table)
        .filter(auth_tokens::token_hash.eq(hash))
        .select(User::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// Returns whether a token was revoked.
pub async fn delete_token(conn: &mut Connection, raw_token: &str) -> Result<bool, DatabaseError> {
    let hash = password::hash_token(raw_token);
    let deleted = diesel::delete(auth_tokens::table.find(hash))
        .execute(conn)
        .await?;
    Ok(deleted == 1)
}

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use crate::utils::DatabaseError;
use foodgram_types::schema::users;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

impl User {
    pub async fn get(conn: &mut Connection, id: i32) -> Result<Option<Self>, DatabaseError> {
        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(conn)
            .await
            .optional()?)
    }

    pub async fn get_by_email(
        conn: &mut Connection,
        email: &str,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
            .await
            .optional()?)
    }

    pub fn into_view(self, is_subscribed: bool) -> foodgram_types::User {
        foodgram_types::User {
            id: self.id,
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            is_subscribed,
        }
    }
}

pub async fn create_user(conn: &mut Connection, new: &NewUser<'_>) -> Result<User, DatabaseError> {
    Ok(diesel::insert_into(users::table)
        .values(new)
        .returning(User::as_returning())
        .get_result(conn)
        .await?)
}

pub async fn set_password_hash(
    conn: &mut Connection,
    id: i32,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    diesel::update(users::table.find(id))
        .set(users::password_hash.eq(password_hash))
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_staff(conn: &mut Connection, id: i32, is_staff: bool) -> Result<bool, DatabaseError> {
    let updated = diesel::update(users::table.find(id))
        .set(users::is_staff.eq(is_staff))
        .execute(conn)
        .await?;
    Ok(updated == 1)
}

pub async fn list_users(
    conn: &mut Connection,
    offset: i64,
    limit: i64,
) -> Result<(Vec<User>, i64), DatabaseError> {
    let count = users::table.count().get_result(conn).await?;
    let rows = users::table
        .select(User::as_select())
        .order_by((users::username.asc(), users::id.asc()))
        .offset(offset)
        .limit(limit)
        .load(conn)
        .await?;
    Ok((rows, count))
}

pub async fn get_users(conn: &mut Connection, ids: &[i32]) -> Result<Vec<User>, DatabaseError> {
    Ok(users::table
        .filter(users::id.eq_any(ids))
        .select(User::as_select())
        .load(conn)
        .await?)
}

#[cfg(test)]
pub(crate) mod test {
    use super::super::connection;
    use super::*;
    use crate::utils::rand::rand_str;

    pub async fn create_rand_user(conn: &mut Connection) -> User {
        let name = rand_str(12);
        let email = format!("{}@example.com", name);
        create_user(
            conn,
            &NewUser {
                email: &email,
                username: &name,
                first_name: "Test",
                last_name: "Cook",
                password_hash: "$argon2id$not-a-real-hash",
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_and_get_user() {
        let mut conn = connection::establish().await.unwrap();
        let user = create_rand_user(&mut conn).await;
        assert!(user.id > 0);
        assert!(!user.is_staff);

        let got = User::get(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(got, user);
        let by_email = User::get_by_email(&mut conn, &user.email).await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn promote_to_staff() {
        let mut conn = connection::establish().await.unwrap();
        let user = create_rand_user(&mut conn).await;
        assert!(set_staff(&mut conn, user.id, true).await.unwrap());
        let got = User::get(&mut conn, user.id).await.unwrap().unwrap();
        assert!(got.is_staff);
        assert!(!set_staff(&mut conn, -1, true).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let mut conn = connection::establish().await.unwrap();
        let user = create_rand_user(&mut conn).await;
        let rv = create_user(
            &mut conn,
            &NewUser {
                email: &user.email,
                username: &rand_str(12),
                first_name: "A",
                last_name: "B",
                password_hash: "x",
            },
        )
        .await;
        assert!(matches!(
            rv.unwrap_err(),
            DatabaseError::DuplicationError { .. }
        ));
    }
}

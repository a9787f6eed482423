use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use super::recipe::Recipe;
use crate::utils::DatabaseError;
use foodgram_types::schema::{recipes_tags, tags};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Insertable, Identifiable, Selectable, Queryable, Associations, Debug)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Tag))]
#[diesel(table_name = recipes_tags)]
#[diesel(primary_key(recipe_id, tag_id))]
pub struct RecipeTag {
    pub recipe_id: i32,
    pub tag_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub slug: &'a str,
}

impl From<Tag> for foodgram_types::Tag {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            color: t.color,
            slug: t.slug,
        }
    }
}

impl Tag {
    pub async fn get(conn: &mut Connection, id: i32) -> Result<Option<Self>, DatabaseError> {
        Ok(tags::table
            .find(id)
            .select(Tag::as_select())
            .first(conn)
            .await
            .optional()?)
    }
}

pub async fn list_tags(conn: &mut Connection) -> Result<Vec<Tag>, DatabaseError> {
    Ok(tags::table
        .select(Tag::as_select())
        .order_by((tags::name.asc(), tags::id.asc()))
        .load(conn)
        .await?)
}

pub async fn create_tag(conn: &mut Connection, new: &NewTag<'_>) -> Result<Tag, DatabaseError> {
    Ok(diesel::insert_into(tags::table)
        .values(new)
        .returning(Tag::as_returning())
        .get_result(conn)
        .await?)
}

/// Ids among `ids` that exist.
pub async fn existing_tag_ids(conn: &mut Connection, ids: &[i32]) -> Result<Vec<i32>, DatabaseError> {
    Ok(tags::table
        .filter(tags::id.eq_any(ids))
        .select(tags::id)
        .load(conn)
        .await?)
}

pub async fn set_recipe_tags(
    conn: &mut Connection,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), DatabaseError> {
    let rows = tag_ids
        .iter()
        .map(|&tag_id| RecipeTag { recipe_id, tag_id })
        .collect::<Vec<_>>();

    diesel::delete(recipes_tags::table.filter(recipes_tags::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await?;

    diesel::insert_into(recipes_tags::table)
        .values(&rows)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_tags_per_recipe(
    conn: &mut Connection,
    recipes: &[Recipe],
) -> Result<Vec<Vec<Tag>>, DatabaseError> {
    let rows = RecipeTag::belonging_to(recipes)
        .inner_join(tags::table)
        .select((RecipeTag::as_select(), Tag::as_select()))
        .order_by(tags::name.asc())
        .load(conn)
        .await?;
    Ok(rows
        .grouped_by(recipes)
        .into_iter()
        .map(|tags| tags.into_iter().map(|(_, tag)| tag).collect())
        .collect())
}

#[cfg(test)]
pub(crate) mod test {
    use super::super::connection;
    use super::*;
    use crate::utils::rand::rand_str;

    pub async fn create_rand_tag(conn: &mut Connection) -> Tag {
        let name = rand_str(10);
        let slug = name.to_lowercase();
        let color = format!("#{:06X}", rand::random::<u32>() & 0xFF_FFFF);
        create_tag(
            conn,
            &NewTag {
                name: &name,
                color: &color,
                slug: &slug,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_tag_is_rejected() {
        let mut conn = connection::establish().await.unwrap();
        let tag = create_rand_tag(&mut conn).await;
        let rv = create_tag(
            &mut conn,
            &NewTag {
                name: &tag.name,
                color: "#000001",
                slug: &rand_str(10),
            },
        )
        .await;
        assert!(matches!(
            rv.unwrap_err(),
            DatabaseError::DuplicationError { ref table } if table == "tags"
        ));
    }

    #[tokio::test]
    async fn existing_ids_filters_unknown() {
        let mut conn = connection::establish().await.unwrap();
        let tag = create_rand_tag(&mut conn).await;
        let found = existing_tag_ids(&mut conn, &[tag.id, -1]).await.unwrap();
        assert_eq!(found, vec![tag.id]);
    }
}

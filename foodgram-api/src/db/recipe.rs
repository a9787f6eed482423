use std::collections::HashMap;

use diesel::expression::BoxableExpression;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use crate::utils::DatabaseError;
use foodgram_types::schema::{cart_items, favorites, recipes, recipes_tags, tags};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub author_id: Option<i32>,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub pub_date: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = recipes)]
pub struct NewRecipe<'a> {
    pub author_id: i32,
    pub name: &'a str,
    pub text: &'a str,
    pub image: &'a str,
    pub cooking_time: i32,
}

#[derive(AsChangeset, Debug, Default, Clone)]
#[diesel(table_name = recipes)]
pub struct ModifyRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
}

impl From<Recipe> for foodgram_types::RecipeSummary {
    fn from(r: Recipe) -> Self {
        Self {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }
    }
}

impl Recipe {
    pub async fn get(conn: &mut Connection, id: i32) -> Result<Option<Self>, DatabaseError> {
        Ok(recipes::table
            .find(id)
            .select(Recipe::as_select())
            .first(conn)
            .await
            .optional()?)
    }

    pub fn is_authored_by(&self, user_id: i32) -> bool {
        self.author_id == Some(user_id)
    }
}

pub async fn create_recipe(conn: &mut Connection, new: &NewRecipe<'_>) -> Result<Recipe, DatabaseError> {
    Ok(diesel::insert_into(recipes::table)
        .values(new)
        .returning(Recipe::as_returning())
        .get_result(conn)
        .await?)
}

pub async fn update_recipe(
    conn: &mut Connection,
    id: i32,
    modified: &ModifyRecipe,
) -> Result<Option<Recipe>, DatabaseError> {
    use diesel::dsl::now;
    Ok(diesel::update(recipes::table.find(id))
        .set((modified, recipes::updated_at.eq(now)))
        .returning(Recipe::as_returning())
        .get_result(conn)
        .await
        .optional()?)
}

/// Quantities, tags, favorites and cart entries go with it through `ON DELETE CASCADE`.
pub async fn delete_recipe(conn: &mut Connection, id: i32) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(recipes::table.find(id))
        .execute(conn)
        .await?;
    Ok(deleted == 1)
}

#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Tag slugs, any of them matches.
    pub tags: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

type Condition = Box<dyn BoxableExpression<recipes::table, Pg, SqlType = Bool>>;

fn filter_condition(filter: &RecipeFilter) -> Condition {
    let mut condition: Condition = Box::new(recipes::id.eq(recipes::id)); // always true, no side effects

    if let Some(author) = filter.author {
        condition = Box::new(condition.and(recipes::author_id.eq(author).assume_not_null()));
    }
    if !filter.tags.is_empty() {
        condition = Box::new(
            condition.and(
                recipes::id.eq_any(
                    recipes_tags::table
                        .inner_join(tags::table)
                        .filter(tags::slug.eq_any(filter.tags.clone()))
                        .select(recipes_tags::recipe_id),
                ),
            ),
        );
    }
    if let Some(user_id) = filter.favorited_by {
        condition = Box::new(
            condition.and(
                recipes::id.eq_any(
                    favorites::table
                        .filter(favorites::user_id.eq(user_id))
                        .select(favorites::recipe_id),
                ),
            ),
        );
    }
    if let Some(user_id) = filter.in_cart_of {
        condition = Box::new(
            condition.and(
                recipes::id.eq_any(
                    cart_items::table
                        .filter(cart_items::user_id.eq(user_id))
                        .select(cart_items::recipe_id),
                ),
            ),
        );
    }
    condition
}

/// Newest first. Returns the page and the total number of matches.
pub async fn search_recipes(
    conn: &mut Connection,
    filter: &RecipeFilter,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Recipe>, i64), DatabaseError> {
    let count = recipes::table
        .filter(filter_condition(filter))
        .count()
        .get_result::<i64>(conn)
        .await?;
    let rows = recipes::table
        .filter(filter_condition(filter))
        .select(Recipe::as_select())
        .order_by((recipes::pub_date.desc(), recipes::id.desc()))
        .offset(offset)
        .limit(limit)
        .load(conn)
        .await?;
    Ok((rows, count))
}

/// Newest recipes of an author, all of them when `limit` is `None`.
pub async fn recipes_by_author(
    conn: &mut Connection,
    author_id: i32,
    limit: Option<i64>,
) -> Result<Vec<Recipe>, DatabaseError> {
    let mut query = recipes::table
        .filter(recipes::author_id.eq(author_id))
        .select(Recipe::as_select())
        .order_by((recipes::pub_date.desc(), recipes::id.desc()))
        .into_boxed();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    Ok(query.load(conn).await?)
}

pub async fn count_by_authors(
    conn: &mut Connection,
    author_ids: &[i32],
) -> Result<HashMap<i32, i64>, DatabaseError> {
    let rows: Vec<(Option<i32>, i64)> = recipes::table
        .filter(recipes::author_id.eq_any(author_ids))
        .group_by(recipes::author_id)
        .select((recipes::author_id, diesel::dsl::count_star()))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(author_id, count)| author_id.map(|id| (id, count)))
        .collect())
}

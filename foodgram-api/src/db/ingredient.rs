use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use super::recipe::Recipe;
use crate::utils::DatabaseError;
use foodgram_types::schema::{ingredients, recipe_ingredients};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

/// Quantity of an ingredient required by a recipe.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = recipe_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeIngredient {
    pub id: i32,
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub amount: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = recipe_ingredients)]
struct NewRecipeIngredient {
    recipe_id: i32,
    ingredient_id: i32,
    amount: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = ingredients)]
pub struct NewIngredient<'a> {
    pub name: &'a str,
    pub measurement_unit: &'a str,
}

impl From<Ingredient> for foodgram_types::Ingredient {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

impl Ingredient {
    pub async fn get(conn: &mut Connection, id: i32) -> Result<Option<Self>, DatabaseError> {
        Ok(ingredients::table
            .find(id)
            .select(Ingredient::as_select())
            .first(conn)
            .await
            .optional()?)
    }
}

/// Case-insensitive name prefix search.
pub async fn search_ingredients(
    conn: &mut Connection,
    name: &str,
) -> Result<Vec<Ingredient>, DatabaseError> {
    let mut query = ingredients::table
        .select(Ingredient::as_select())
        .order_by((ingredients::name.asc(), ingredients::id.asc()))
        .into_boxed();
    let name = name.trim();
    if !name.is_empty() {
        let escaped = name
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        query = query.filter(ingredients::name.ilike(format!("{}%", escaped)));
    }
    Ok(query.load(conn).await?)
}

pub async fn create_ingredient(
    conn: &mut Connection,
    new: &NewIngredient<'_>,
) -> Result<Ingredient, DatabaseError> {
    Ok(diesel::insert_into(ingredients::table)
        .values(new)
        .returning(Ingredient::as_returning())
        .get_result(conn)
        .await?)
}

pub async fn existing_ingredient_ids(
    conn: &mut Connection,
    ids: &[i32],
) -> Result<Vec<i32>, DatabaseError> {
    Ok(ingredients::table
        .filter(ingredients::id.eq_any(ids))
        .select(ingredients::id)
        .load(conn)
        .await?)
}

/// Replaces the quantities of a recipe. `amounts` holds `(ingredient_id, amount)`.
pub async fn set_recipe_ingredients(
    conn: &mut Connection,
    recipe_id: i32,
    amounts: &[(i32, i32)],
) -> Result<(), DatabaseError> {
    let rows = amounts
        .iter()
        .map(|&(ingredient_id, amount)| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            amount,
        })
        .collect::<Vec<_>>();

    diesel::delete(
        recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
    )
    .execute(conn)
    .await?;

    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn get_ingredients_per_recipe(
    conn: &mut Connection,
    recipes: &[Recipe],
) -> Result<Vec<Vec<(RecipeIngredient, Ingredient)>>, DatabaseError> {
    let rows = RecipeIngredient::belonging_to(recipes)
        .inner_join(ingredients::table)
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .order_by(recipe_ingredients::id.asc())
        .load(conn)
        .await?;
    Ok(rows.grouped_by(recipes))
}

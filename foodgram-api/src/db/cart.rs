use std::collections::HashSet;

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection as Connection, RunQueryDsl};

use crate::shopping::CartLine;
use crate::utils::{DatabaseError, RelationError};
use foodgram_types::schema::{cart_items, ingredients, recipe_ingredients};

#[derive(Insertable, Debug)]
#[diesel(table_name = cart_items)]
struct NewCartItem {
    user_id: i32,
    recipe_id: i32,
}

pub async fn add_to_cart(
    conn: &mut Connection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), RelationError> {
    diesel::insert_into(cart_items::table)
        .values(&NewCartItem { user_id, recipe_id })
        .execute(conn)
        .await
        .map_err(|e| RelationError::from_insert("shopping cart item", e))?;
    Ok(())
}

pub async fn remove_from_cart(
    conn: &mut Connection,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), RelationError> {
    let deleted = diesel::delete(cart_items::table.find((user_id, recipe_id)))
        .execute(conn)
        .await?;
    if deleted == 0 {
        return Err(RelationError::NotFound("shopping cart item"));
    }
    Ok(())
}

pub async fn in_cart_among(
    conn: &mut Connection,
    user_id: i32,
    recipe_ids: &[i32],
) -> Result<HashSet<i32>, DatabaseError> {
    let rows: Vec<i32> = cart_items::table
        .filter(cart_items::user_id.eq(user_id))
        .filter(cart_items::recipe_id.eq_any(recipe_ids))
        .select(cart_items::recipe_id)
        .load(conn)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Every ingredient quantity of every recipe in the user's cart, unmerged,
/// ordered by ingredient name then id.
pub async fn list_cart_lines(
    conn: &mut Connection,
    user_id: i32,
) -> Result<Vec<CartLine>, DatabaseError> {
    let rows: Vec<(i32, String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(
            recipe_ingredients::recipe_id.eq_any(
                cart_items::table
                    .filter(cart_items::user_id.eq(user_id))
                    .select(cart_items::recipe_id),
            ),
        )
        .select((
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .order_by((ingredients::name.asc(), ingredients::id.asc()))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(ingredient_id, name, measurement_unit, amount)| CartLine {
            ingredient_id,
            name,
            measurement_unit,
            amount,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::connection;
    use super::super::ingredient::{set_recipe_ingredients, test::create_rand_ingredient};
    use super::super::recipe::test::create_rand_recipe;
    use super::super::user::test::create_rand_user;
    use super::*;
    use crate::shopping::{aggregate, ShoppingList};

    #[tokio::test]
    async fn cart_lines_merge_into_shopping_list() {
        let mut conn = connection::establish().await.unwrap();
        let author = create_rand_user(&mut conn).await;
        let buyer = create_rand_user(&mut conn).await;
        let flour = create_rand_ingredient(&mut conn, "g").await;
        let eggs = create_rand_ingredient(&mut conn, "pcs").await;

        let a = create_rand_recipe(&mut conn, author.id).await;
        set_recipe_ingredients(&mut conn, a.id, &[(flour.id, 200), (eggs.id, 2)])
            .await
            .unwrap();
        let b = create_rand_recipe(&mut conn, author.id).await;
        set_recipe_ingredients(&mut conn, b.id, &[(flour.id, 300), (eggs.id, 1)])
            .await
            .unwrap();

        let lines = list_cart_lines(&mut conn, buyer.id).await.unwrap();
        assert_eq!(aggregate(lines), ShoppingList::Empty);

        add_to_cart(&mut conn, buyer.id, a.id).await.unwrap();
        add_to_cart(&mut conn, buyer.id, b.id).await.unwrap();
        assert!(matches!(
            add_to_cart(&mut conn, buyer.id, b.id).await.unwrap_err(),
            RelationError::AlreadyExists(_)
        ));

        let lines = list_cart_lines(&mut conn, buyer.id).await.unwrap();
        assert_eq!(lines.len(), 4);
        let items = aggregate(lines).into_items().unwrap();
        let amounts: Vec<(i32, i64)> = items.iter().map(|i| (i.id, i.amount)).collect();
        assert!(amounts.contains(&(flour.id, 500)));
        assert!(amounts.contains(&(eggs.id, 3)));

        let collated: Vec<i32> = ingredients::table
            .filter(ingredients::id.eq_any([flour.id, eggs.id]))
            .order_by((ingredients::name.asc(), ingredients::id.asc()))
            .select(ingredients::id)
            .load(&mut conn)
            .await
            .unwrap();
        let ids: Vec<i32> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, collated);

        remove_from_cart(&mut conn, buyer.id, a.id).await.unwrap();
        assert!(matches!(
            remove_from_cart(&mut conn, buyer.id, a.id).await.unwrap_err(),
            RelationError::NotFound(_)
        ));
        let in_cart = in_cart_among(&mut conn, buyer.id, &[a.id, b.id]).await.unwrap();
        assert_eq!(in_cart, HashSet::from([b.id]));
    }
}

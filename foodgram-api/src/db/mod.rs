pub mod cart;
pub mod connection;
pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod subscription;
pub mod tag;
pub mod token;
pub mod user;

use std::collections::{HashMap, HashSet};

use diesel_async::AsyncPgConnection as Connection;
use itertools::Itertools;

use crate::utils::DatabaseError;
use recipe::Recipe;
use user::User;

async fn subscribed_for(
    conn: &mut Connection,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DatabaseError> {
    match viewer {
        Some(viewer) => subscription::subscribed_among(conn, viewer, author_ids).await,
        None => Ok(HashSet::new()),
    }
}

/// Full representation of `recipes` as seen by `viewer`, in the given order.
pub async fn get_recipe_details(
    conn: &mut Connection,
    recipes: Vec<Recipe>,
    viewer: Option<i32>,
) -> Result<Vec<foodgram_types::Recipe>, DatabaseError> {
    let tags = tag::get_tags_per_recipe(conn, &recipes).await?;
    let ingredients = ingredient::get_ingredients_per_recipe(conn, &recipes).await?;

    let recipe_ids = recipes.iter().map(|r| r.id).collect_vec();
    let author_ids = recipes
        .iter()
        .filter_map(|r| r.author_id)
        .unique()
        .collect_vec();
    let authors: HashMap<i32, User> = user::get_users(conn, &author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let subscribed = subscribed_for(conn, viewer, &author_ids).await?;
    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            favorite::favorited_among(conn, viewer, &recipe_ids).await?,
            cart::in_cart_among(conn, viewer, &recipe_ids).await?,
        ),
        None => Default::default(),
    };

    Ok(recipes
        .into_iter()
        .zip(tags)
        .zip(ingredients)
        .map(|((r, tags), ingredients)| foodgram_types::Recipe {
            id: r.id,
            tags: tags.into_iter().map(Into::into).collect(),
            author: r
                .author_id
                .and_then(|id| authors.get(&id))
                .map(|u| u.clone().into_view(subscribed.contains(&u.id))),
            ingredients: ingredients
                .into_iter()
                .map(|(q, i)| foodgram_types::RecipeIngredient {
                    id: i.id,
                    name: i.name,
                    measurement_unit: i.measurement_unit,
                    amount: q.amount,
                })
                .collect(),
            is_favorited: favorited.contains(&r.id),
            is_in_shopping_cart: in_cart.contains(&r.id),
            name: r.name,
            image: r.image,
            text: r.text,
            cooking_time: r.cooking_time,
            pub_date: r.pub_date,
        })
        .collect())
}

pub async fn get_user_details(
    conn: &mut Connection,
    users: Vec<User>,
    viewer: Option<i32>,
) -> Result<Vec<foodgram_types::User>, DatabaseError> {
    let ids = users.iter().map(|u| u.id).collect_vec();
    let subscribed = subscribed_for(conn, viewer, &ids).await?;
    Ok(users
        .into_iter()
        .map(|u| {
            let is_subscribed = subscribed.contains(&u.id);
            u.into_view(is_subscribed)
        })
        .collect())
}

/// Authors with their newest recipes, at most `recipes_limit` each.
pub async fn get_author_details(
    conn: &mut Connection,
    authors: Vec<User>,
    viewer: Option<i32>,
    recipes_limit: Option<i64>,
) -> Result<Vec<foodgram_types::Author>, DatabaseError> {
    let ids = authors.iter().map(|u| u.id).collect_vec();
    let counts = recipe::count_by_authors(conn, &ids).await?;
    let subscribed = subscribed_for(conn, viewer, &ids).await?;

    let mut rv = Vec::with_capacity(authors.len());
    for u in authors {
        let recipes = recipe::recipes_by_author(conn, u.id, recipes_limit).await?;
        rv.push(foodgram_types::Author {
            id: u.id,
            is_subscribed: subscribed.contains(&u.id),
            recipes_count: counts.get(&u.id).copied().unwrap_or_default(),
            recipes: recipes.into_iter().map(Into::into).collect(),
            email: u.email,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
        });
    }
    Ok(rv)
}

use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection};
use foodgram_types::{
    CreateRecipe, IngredientAmount, ModifyRecipe, Page, Recipe, RecipeSummary, ShoppingListItem,
    ValidationErrors,
};
use itertools::Itertools;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::Connection;
use tracing::{debug, info};

use super::configs::Config;
use super::errors::Error;
use super::fairings::db::Db;
use super::guards::{CurrentUser, Viewer};
use super::pagination::Pagination;
use crate::db::{self, cart, favorite, ingredient, recipe, tag};
use crate::shopping::{self, ShoppingList};
use crate::validation;

async fn find_recipe(db: &mut AsyncPgConnection, id: i32) -> Result<recipe::Recipe, Error> {
    recipe::Recipe::get(db, id)
        .await?
        .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))
}

fn ensure_author(m: &recipe::Recipe, current: &CurrentUser) -> Result<(), Error> {
    if m.is_authored_by(current.id) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "Only the author can change this recipe".to_string(),
        ))
    }
}

/// Ingredient and tag ids that do not exist, keyed by field.
async fn reference_errors(
    db: &mut AsyncPgConnection,
    ingredients: &[IngredientAmount],
    tags: &[i32],
) -> Result<ValidationErrors, Error> {
    let mut errors = ValidationErrors::new();

    let ingredient_ids = ingredients.iter().map(|i| i.id).collect_vec();
    if !ingredient_ids.is_empty() {
        let found = ingredient::existing_ingredient_ids(db, &ingredient_ids).await?;
        for id in validation::missing_ids(ingredient_ids, &found) {
            errors.add("ingredients", format!("Ingredient {} does not exist", id));
        }
    }
    if !tags.is_empty() {
        let found = tag::existing_tag_ids(db, tags).await?;
        for id in validation::missing_ids(tags.iter().copied(), &found) {
            errors.add("tags", format!("Tag {} does not exist", id));
        }
    }
    Ok(errors)
}

fn collect_errors(
    validated: Result<(), ValidationErrors>,
    references: ValidationErrors,
) -> Result<(), ValidationErrors> {
    let mut errors = validated.err().unwrap_or_default();
    errors.merge(references);
    errors.into_result()
}

fn amounts(ingredients: &[IngredientAmount]) -> Vec<(i32, i32)> {
    ingredients.iter().map(|i| (i.id, i.amount)).collect()
}

/// `1` turns a relation filter on, anything else leaves it off.
fn flag(value: Option<u8>) -> bool {
    value == Some(1)
}

/// List recipes
#[utoipa::path(
    get,
    path = "/",
    params(
        ("page" = inline(Option<i64>), Query, description = "1-based page number"),
        ("limit" = inline(Option<i64>), Query, description = "Page size"),
        ("author" = inline(Option<i32>), Query, description = "Author id"),
        ("tags" = inline(Option<Vec<String>>), Query, description = "Tag slugs, repeatable, any match"),
        ("is_favorited" = inline(Option<u8>), Query, description = "1 to list the caller's favorites"),
        ("is_in_shopping_cart" = inline(Option<u8>), Query, description = "1 to list the caller's cart")
    ),
    responses(
        (status = 200, description = "Recipes, newest first", body = Page<Recipe>)
    )
)]
#[get("/?<page>&<limit>&<author>&<tags>&<is_favorited>&<is_in_shopping_cart>")]
#[allow(clippy::too_many_arguments)]
pub async fn list_recipes(
    mut db: Connection<Db>,
    viewer: Viewer,
    config: &State<Config>,
    page: Option<i64>,
    limit: Option<i64>,
    author: Option<i32>,
    tags: Vec<String>,
    is_favorited: Option<u8>,
    is_in_shopping_cart: Option<u8>,
) -> Result<Json<Page<Recipe>>, Error> {
    let pagination = Pagination::new(page, limit, config.page_size)?;
    let viewer = viewer.id();
    let filter = recipe::RecipeFilter {
        author,
        tags,
        favorited_by: viewer.filter(|_| flag(is_favorited)),
        in_cart_of: viewer.filter(|_| flag(is_in_shopping_cart)),
    };
    debug!(?filter, ?pagination, "listing recipes");

    let (rows, count) =
        recipe::search_recipes(&mut db, &filter, pagination.offset(), pagination.limit).await?;
    let results = db::get_recipe_details(&mut db, rows, viewer).await?;
    Ok(Json(pagination.wrap(count, results)))
}

/// Get a recipe
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 200, description = "Recipe found", body = Recipe),
        (status = 404, description = "Recipe not found")
    )
)]
#[get("/<id>")]
pub async fn get_recipe(
    mut db: Connection<Db>,
    viewer: Viewer,
    id: i32,
) -> Result<Json<Recipe>, Error> {
    let m = find_recipe(&mut db, id).await?;
    Ok(Json(
        db::get_recipe_details(&mut db, vec![m], viewer.id())
            .await?
            .remove(0),
    ))
}

/// Create a recipe
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateRecipe,
    responses(
        (status = 201, description = "Recipe created", body = Recipe),
        (status = 400, description = "Invalid payload", body = ValidationErrors),
        (status = 401, description = "Not authenticated")
    ),
    security(("token" = []))
)]
#[post("/", format = "application/json", data = "<payload>")]
pub async fn create_recipe(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    payload: Json<CreateRecipe>,
) -> Result<(Status, Json<Recipe>), Error> {
    let payload = payload.into_inner();
    let references = reference_errors(&mut db, &payload.ingredients, &payload.tags).await?;
    collect_errors(
        validation::validate_new_recipe(&payload, &config.validation),
        references,
    )?;

    let author_id = current.id;
    let rv = db
        .transaction::<_, Error, _>(|db| {
            async move {
                let m = recipe::create_recipe(
                    db,
                    &recipe::NewRecipe {
                        author_id,
                        name: payload.name.trim(),
                        text: &payload.text,
                        image: &payload.image,
                        cooking_time: payload.cooking_time,
                    },
                )
                .await?;
                ingredient::set_recipe_ingredients(db, m.id, &amounts(&payload.ingredients))
                    .await?;
                tag::set_recipe_tags(db, m.id, &payload.tags).await?;

                Ok(db::get_recipe_details(db, vec![m], Some(author_id))
                    .await?
                    .remove(0))
            }
            .scope_boxed()
        })
        .await?;

    info!(id = rv.id, author_id, "recipe created");
    Ok((Status::Created, Json(rv)))
}

/// Update a recipe, author only
///
/// Ingredients and tags are replaced as a whole.
#[utoipa::path(
    patch,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    request_body = ModifyRecipe,
    responses(
        (status = 200, description = "Recipe updated", body = Recipe),
        (status = 400, description = "Invalid payload", body = ValidationErrors),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[patch("/<id>", format = "application/json", data = "<payload>")]
pub async fn update_recipe(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    id: i32,
    payload: Json<ModifyRecipe>,
) -> Result<Json<Recipe>, Error> {
    let existing = find_recipe(&mut db, id).await?;
    ensure_author(&existing, &current)?;

    let payload = payload.into_inner();
    let references = reference_errors(&mut db, &payload.ingredients, &payload.tags).await?;
    collect_errors(
        validation::validate_recipe_update(&payload, &config.validation),
        references,
    )?;

    let viewer = current.id;
    let rv = db
        .transaction::<_, Error, _>(|db| {
            async move {
                let changes = recipe::ModifyRecipe {
                    name: payload.name.map(|name| name.trim().to_string()),
                    text: payload.text,
                    image: payload.image,
                    cooking_time: payload.cooking_time,
                };
                let m = recipe::update_recipe(db, id, &changes)
                    .await?
                    .ok_or_else(|| Error::NotFound("Recipe not found".to_string()))?;
                ingredient::set_recipe_ingredients(db, m.id, &amounts(&payload.ingredients))
                    .await?;
                tag::set_recipe_tags(db, m.id, &payload.tags).await?;

                Ok(db::get_recipe_details(db, vec![m], Some(viewer))
                    .await?
                    .remove(0))
            }
            .scope_boxed()
        })
        .await?;

    info!(id, "recipe updated");
    Ok(Json(rv))
}

/// Delete a recipe, author only
#[utoipa::path(
    delete,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[delete("/<id>")]
pub async fn delete_recipe(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<Status, Error> {
    let existing = find_recipe(&mut db, id).await?;
    ensure_author(&existing, &current)?;

    if !recipe::delete_recipe(&mut db, id).await? {
        return Err(Error::NotFound("Recipe not found".to_string()));
    }
    info!(id, "recipe deleted");
    Ok(Status::NoContent)
}

/// Add a recipe to favorites
#[utoipa::path(
    post,
    path = "/{id}/favorite",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeSummary),
        (status = 400, description = "Already in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[post("/<id>/favorite")]
pub async fn add_favorite(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<(Status, Json<RecipeSummary>), Error> {
    let m = find_recipe(&mut db, id).await?;
    favorite::add_favorite(&mut db, current.id, m.id).await?;
    Ok((Status::Created, Json(m.into())))
}

/// Remove a recipe from favorites
#[utoipa::path(
    delete,
    path = "/{id}/favorite",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[delete("/<id>/favorite")]
pub async fn remove_favorite(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<Status, Error> {
    let m = find_recipe(&mut db, id).await?;
    favorite::remove_favorite(&mut db, current.id, m.id).await?;
    Ok(Status::NoContent)
}

/// Add a recipe to the shopping cart
#[utoipa::path(
    post,
    path = "/{id}/shopping_cart",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 201, description = "Added to the cart", body = RecipeSummary),
        (status = 400, description = "Already in the cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[post("/<id>/shopping_cart")]
pub async fn add_to_cart(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<(Status, Json<RecipeSummary>), Error> {
    let m = find_recipe(&mut db, id).await?;
    cart::add_to_cart(&mut db, current.id, m.id).await?;
    Ok((Status::Created, Json(m.into())))
}

/// Remove a recipe from the shopping cart
#[utoipa::path(
    delete,
    path = "/{id}/shopping_cart",
    params(
        ("id" = i32, Path, description = "Recipe id")
    ),
    responses(
        (status = 204, description = "Removed from the cart"),
        (status = 400, description = "Not in the cart"),
        (status = 404, description = "Recipe not found")
    ),
    security(("token" = []))
)]
#[delete("/<id>/shopping_cart")]
pub async fn remove_from_cart(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<Status, Error> {
    let m = find_recipe(&mut db, id).await?;
    cart::remove_from_cart(&mut db, current.id, m.id).await?;
    Ok(Status::NoContent)
}

#[derive(Responder, Debug)]
pub enum ShoppingCartView {
    #[response(status = 200)]
    Items(Json<Vec<ShoppingListItem>>),
    #[response(status = 204)]
    Empty(()),
}

/// Aggregated shopping list
#[utoipa::path(
    get,
    path = "/shopping_cart",
    responses(
        (status = 200, description = "Ingredients of every recipe in the cart, merged and ordered by name", body = Vec<ShoppingListItem>),
        (status = 204, description = "The cart is empty")
    ),
    security(("token" = []))
)]
#[get("/shopping_cart")]
pub async fn shopping_cart(
    current: CurrentUser,
    mut db: Connection<Db>,
) -> Result<ShoppingCartView, Error> {
    let lines = cart::list_cart_lines(&mut db, current.id).await?;
    Ok(match shopping::aggregate(lines) {
        ShoppingList::Empty => ShoppingCartView::Empty(()),
        ShoppingList::Items(items) => ShoppingCartView::Items(Json(items)),
    })
}

#[derive(Responder, Debug)]
pub enum ShoppingListDocument {
    #[response(status = 200, content_type = "plain")]
    Document(String, Header<'static>),
    #[response(status = 204)]
    Empty(()),
}

/// Download the shopping list as a text document
#[utoipa::path(
    get,
    path = "/download_shopping_cart",
    responses(
        (status = 200, description = "Shopping list attachment", content_type = "text/plain", body = String),
        (status = 204, description = "The cart is empty")
    ),
    security(("token" = []))
)]
#[get("/download_shopping_cart")]
pub async fn download_shopping_cart(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
) -> Result<ShoppingListDocument, Error> {
    let lines = cart::list_cart_lines(&mut db, current.id).await?;
    let items = match shopping::aggregate(lines) {
        ShoppingList::Empty => return Ok(ShoppingListDocument::Empty(())),
        ShoppingList::Items(items) => items,
    };

    let options = &config.shopping_list;
    info!(user_id = current.id, items = items.len(), "shopping list rendered");
    Ok(ShoppingListDocument::Document(
        shopping::render(&items, options),
        Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", options.filename),
        ),
    ))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_recipes,
        get_recipe,
        create_recipe,
        update_recipe,
        delete_recipe,
        add_favorite,
        remove_favorite,
        add_to_cart,
        remove_from_cart,
        shopping_cart,
        download_shopping_cart
    ]
}

pub(crate) mod misc {
    use super::*;

    use utoipa::OpenApi;

    use crate::misc::TokenAuth;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Recipes API", description = "Recipes, favorites and the shopping cart", version = "1.0"),
        servers((url = "/api/recipes")),
        paths(
            super::list_recipes,
            super::get_recipe,
            super::create_recipe,
            super::update_recipe,
            super::delete_recipe,
            super::add_favorite,
            super::remove_favorite,
            super::add_to_cart,
            super::remove_from_cart,
            super::shopping_cart,
            super::download_shopping_cart
        ),
        components(schemas(
            Recipe,
            RecipeSummary,
            CreateRecipe,
            ModifyRecipe,
            IngredientAmount,
            ShoppingListItem,
            ValidationErrors
        )),
        modifiers(&TokenAuth)
    )]
    pub struct ApiDoc;
}

use foodgram_types::{CreateIngredient, Ingredient, ValidationErrors};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::Connection;
use tracing::info;

use super::configs::Config;
use super::errors::Error;
use super::fairings::db::Db;
use super::guards::CurrentUser;
use crate::db::ingredient;
use crate::validation;

/// Search ingredients by name prefix
#[utoipa::path(
    get,
    path = "/",
    params(
        ("name" = inline(Option<&str>), Query, description = "Case-insensitive name prefix")
    ),
    responses(
        (status = 200, description = "Matching ingredients ordered by name", body = Vec<Ingredient>)
    )
)]
#[get("/?<name>")]
pub async fn search_ingredients(
    mut db: Connection<Db>,
    name: Option<&str>,
) -> Result<Json<Vec<Ingredient>>, Error> {
    let rv = ingredient::search_ingredients(&mut db, name.unwrap_or_default()).await?;
    Ok(Json(rv.into_iter().map(Into::into).collect()))
}

/// Get an ingredient
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "Ingredient id")
    ),
    responses(
        (status = 200, description = "Ingredient found", body = Ingredient),
        (status = 404, description = "Ingredient not found")
    )
)]
#[get("/<id>")]
pub async fn get_ingredient(mut db: Connection<Db>, id: i32) -> Result<Json<Ingredient>, Error> {
    ingredient::Ingredient::get(&mut db, id)
        .await?
        .map(|i| Json(i.into()))
        .ok_or_else(|| Error::NotFound("Ingredient not found".to_string()))
}

/// Create an ingredient, staff only
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateIngredient,
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 400, description = "Invalid payload or duplicate ingredient", body = ValidationErrors),
        (status = 403, description = "Not a staff user")
    ),
    security(("token" = []))
)]
#[post("/", format = "application/json", data = "<payload>")]
pub async fn create_ingredient(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    payload: Json<CreateIngredient>,
) -> Result<(Status, Json<Ingredient>), Error> {
    current.require_staff()?;
    let payload = payload.into_inner();
    validation::validate_new_ingredient(&payload, &config.validation)?;

    let m = ingredient::create_ingredient(
        &mut db,
        &ingredient::NewIngredient {
            name: payload.name.trim(),
            measurement_unit: payload.measurement_unit.trim(),
        },
    )
    .await?;
    info!(id = m.id, name = %m.name, "ingredient created");
    Ok((Status::Created, Json(m.into())))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![search_ingredients, get_ingredient, create_ingredient]
}

pub(crate) mod misc {
    use super::*;

    use utoipa::OpenApi;

    use crate::misc::TokenAuth;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Ingredients API", description = "Ingredient catalogue", version = "1.0"),
        servers((url = "/api/ingredients")),
        paths(super::search_ingredients, super::get_ingredient, super::create_ingredient),
        components(schemas(Ingredient, CreateIngredient)),
        modifiers(&TokenAuth)
    )]
    pub struct ApiDoc;
}

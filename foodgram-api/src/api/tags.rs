use foodgram_types::{CreateTag, Tag, ValidationErrors};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::Connection;
use tracing::info;

use super::configs::Config;
use super::errors::Error;
use super::fairings::db::Db;
use super::guards::CurrentUser;
use crate::db::tag;
use crate::validation;

/// List tags
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "All tags ordered by name", body = Vec<Tag>)
    )
)]
#[get("/")]
pub async fn list_tags(mut db: Connection<Db>) -> Result<Json<Vec<Tag>>, Error> {
    let rv = tag::list_tags(&mut db).await?;
    Ok(Json(rv.into_iter().map(Into::into).collect()))
}

/// Get a tag
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "Tag id")
    ),
    responses(
        (status = 200, description = "Tag found", body = Tag),
        (status = 404, description = "Tag not found")
    )
)]
#[get("/<id>")]
pub async fn get_tag(mut db: Connection<Db>, id: i32) -> Result<Json<Tag>, Error> {
    tag::Tag::get(&mut db, id)
        .await?
        .map(|t| Json(t.into()))
        .ok_or_else(|| Error::NotFound("Tag not found".to_string()))
}

/// Create a tag, staff only
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateTag,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Invalid payload or duplicate tag", body = ValidationErrors),
        (status = 403, description = "Not a staff user")
    ),
    security(("token" = []))
)]
#[post("/", format = "application/json", data = "<payload>")]
pub async fn create_tag(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    payload: Json<CreateTag>,
) -> Result<(Status, Json<Tag>), Error> {
    current.require_staff()?;
    let payload = payload.into_inner();
    validation::validate_new_tag(&payload, &config.validation)?;

    let m = tag::create_tag(
        &mut db,
        &tag::NewTag {
            name: payload.name.trim(),
            color: &payload.color.to_uppercase(),
            slug: &payload.slug,
        },
    )
    .await?;
    info!(id = m.id, slug = %m.slug, "tag created");
    Ok((Status::Created, Json(m.into())))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_tags, get_tag, create_tag]
}

pub(crate) mod misc {
    use super::*;

    use utoipa::OpenApi;

    use crate::misc::TokenAuth;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Tags API", description = "Recipe tags", version = "1.0"),
        servers((url = "/api/tags")),
        paths(super::list_tags, super::get_tag, super::create_tag),
        components(schemas(Tag, CreateTag)),
        modifiers(&TokenAuth)
    )]
    pub struct ApiDoc;
}

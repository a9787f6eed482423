#[macro_use]
extern crate rocket;

pub mod api;
pub mod db;
pub mod shopping;
pub mod utils;
pub mod validation;

#[cfg(test)]
#[cfg(not(tarpaulin_include))]
#[ctor::ctor]
fn init() {
    crate::utils::logging::setup_console_log();
}

pub(crate) mod misc {
    use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
    use utoipa::{Modify, OpenApi};
    use utoipa_swagger_ui::SwaggerUi;
    use utoipa_swagger_ui::Url;

    /// Registers the `token` scheme: `Authorization: Token <token>`.
    pub struct TokenAuth;

    impl Modify for TokenAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let components = openapi.components.get_or_insert_with(Default::default);
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <token>, obtained from /api/auth/token/login",
                ))),
            );
        }
    }

    #[derive(OpenApi)]
    #[openapi(info(
        title = "Foodgram API",
        description = r"## Main API documentation

- [Users API](/swagger-ui/?urls.primaryName=users)
- [Auth API](/swagger-ui/?urls.primaryName=auth)
- [Tags API](/swagger-ui/?urls.primaryName=tags)
- [Ingredients API](/swagger-ui/?urls.primaryName=ingredients)
- [Recipes API](/swagger-ui/?urls.primaryName=recipes)
    ",
        version = "1.0"
    ))]
    pub struct ApiDoc;

    pub fn docs() -> Vec<rocket::Route> {
        use crate::api::{auth, ingredients, recipes, tags, users};
        SwaggerUi::new("/swagger-ui/<_..>")
            .urls(vec![
                (
                    Url::with_primary("main", "/api-docs/openapi.json", true),
                    ApiDoc::openapi(),
                ),
                (
                    Url::new("users", "/api-docs/openapi-users.json"),
                    users::misc::ApiDoc::openapi(),
                ),
                (
                    Url::new("auth", "/api-docs/openapi-auth.json"),
                    auth::misc::ApiDoc::openapi(),
                ),
                (
                    Url::new("tags", "/api-docs/openapi-tags.json"),
                    tags::misc::ApiDoc::openapi(),
                ),
                (
                    Url::new("ingredients", "/api-docs/openapi-ingredients.json"),
                    ingredients::misc::ApiDoc::openapi(),
                ),
                (
                    Url::new("recipes", "/api-docs/openapi-recipes.json"),
                    recipes::misc::ApiDoc::openapi(),
                ),
            ])
            .into()
    }

}

#[cfg(not(tarpaulin_include))]
pub async fn rocket() -> rocket::Rocket<rocket::Build> {
    use std::path::Path;

    use rocket::fairing::AdHoc;
    use rocket::fs::FileServer;
    use rocket_db_pools::Database;

    use crate::api::configs::{self, Config};
    use crate::api::fairings::db::Db;
    use crate::api::{auth, ingredients, recipes, tags, users};
    use crate::misc;

    let cfg_provider = configs::config_provider();
    let log_dir = cfg_provider
        .extract_inner::<Option<String>>("log_dir")
        .ok()
        .flatten();
    crate::utils::logging::setup_log(log_dir.as_deref().map(Path::new));

    let ui_path = cfg_provider
        .extract_inner::<Option<String>>("ui_path")
        .ok()
        .flatten();

    let mut builder = rocket::custom(cfg_provider);
    if let Some(ui_path) = ui_path {
        // Serve the frontend build when a directory is configured
        builder = builder.mount("/", FileServer::from(ui_path));
    }
    builder
        .attach(AdHoc::try_on_ignite("Database migrations", |rocket| async move {
            let url = match rocket.figment().extract_inner::<String>("databases.main.url") {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(%e, "database url is not configured");
                    return Err(rocket);
                }
            };
            match crate::db::connection::run_migrations(&url).await {
                Ok(()) => Ok(rocket),
                Err(e) => {
                    tracing::error!(?e, "failed to run migrations");
                    Err(rocket)
                }
            }
        }))
        .attach(Db::init())
        .mount("/api/users", users::routes())
        .mount("/api/auth/token", auth::routes())
        .mount("/api/tags", tags::routes())
        .mount("/api/ingredients", ingredients::routes())
        .mount("/api/recipes", recipes::routes())
        .mount("/", misc::docs())
        .attach(AdHoc::config::<Config>())
}

use diesel_async::AsyncPgConnection;
use foodgram_types::{Author, CreateUser, Page, SetPassword, User, ValidationErrors};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use rocket_db_pools::Connection;
use tracing::info;

use super::configs::Config;
use super::errors::Error;
use super::fairings::db::Db;
use super::guards::{CurrentUser, Viewer};
use super::pagination::Pagination;
use crate::db::{self, subscription, user};
use crate::utils::password;
use crate::validation;

fn check_recipes_limit(recipes_limit: Option<i64>) -> Result<Option<i64>, Error> {
    match recipes_limit {
        Some(n) if n < 0 => Err(Error::BadRequest(
            "recipes_limit must not be negative".to_string(),
        )),
        rv => Ok(rv),
    }
}

async fn find_user(db: &mut AsyncPgConnection, id: i32) -> Result<user::User, Error> {
    user::User::get(db, id)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid payload or email/username taken", body = ValidationErrors)
    )
)]
#[post("/", format = "application/json", data = "<payload>")]
pub async fn create_user(
    mut db: Connection<Db>,
    config: &State<Config>,
    payload: Json<CreateUser>,
) -> Result<(Status, Json<User>), Error> {
    let payload = payload.into_inner();
    validation::validate_new_user(&payload, &config.validation)?;

    let password_hash = password::hash_password_blocking(payload.password).await?;
    let m = user::create_user(
        &mut db,
        &user::NewUser {
            email: payload.email.trim(),
            username: &payload.username,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            password_hash: &password_hash,
        },
    )
    .await?;
    info!(id = m.id, username = %m.username, "user registered");

    Ok((Status::Created, Json(m.into_view(false))))
}

/// List users
#[utoipa::path(
    get,
    path = "/",
    params(
        ("page" = inline(Option<i64>), Query, description = "1-based page number"),
        ("limit" = inline(Option<i64>), Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Users listed", body = Page<User>)
    )
)]
#[get("/?<page>&<limit>")]
pub async fn list_users(
    mut db: Connection<Db>,
    viewer: Viewer,
    config: &State<Config>,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Json<Page<User>>, Error> {
    let pagination = Pagination::new(page, limit, config.page_size)?;
    let (rows, count) = user::list_users(&mut db, pagination.offset(), pagination.limit).await?;
    let results = db::get_user_details(&mut db, rows, viewer.id()).await?;
    Ok(Json(pagination.wrap(count, results)))
}

/// Get the current user
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    ),
    security(("token" = []))
)]
#[get("/me")]
pub async fn me(current: CurrentUser, mut db: Connection<Db>) -> Result<Json<User>, Error> {
    let m = find_user(&mut db, current.id).await?;
    Ok(Json(m.into_view(false)))
}

/// Get a user profile
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 404, description = "User not found")
    )
)]
#[get("/<id>")]
pub async fn get_user(
    mut db: Connection<Db>,
    viewer: Viewer,
    id: i32,
) -> Result<Json<User>, Error> {
    let m = find_user(&mut db, id).await?;
    Ok(Json(
        db::get_user_details(&mut db, vec![m], viewer.id())
            .await?
            .remove(0),
    ))
}

/// Change the password of the current user
#[utoipa::path(
    post,
    path = "/set_password",
    request_body = SetPassword,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or invalid new one", body = ValidationErrors)
    ),
    security(("token" = []))
)]
#[post("/set_password", format = "application/json", data = "<payload>")]
pub async fn set_password(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    payload: Json<SetPassword>,
) -> Result<Status, Error> {
    let payload = payload.into_inner();
    let mut errors = ValidationErrors::new();
    validation::check_password("new_password", &payload.new_password, &config.validation, &mut errors);
    errors.into_result()?;

    let m = find_user(&mut db, current.id).await?;
    let valid =
        password::verify_password_blocking(payload.current_password, m.password_hash).await?;
    if !valid {
        return Err(ValidationErrors::single("current_password", "Incorrect password").into());
    }

    let password_hash = password::hash_password_blocking(payload.new_password).await?;
    user::set_password_hash(&mut db, m.id, &password_hash).await?;
    info!(id = m.id, "password changed");
    Ok(Status::NoContent)
}

/// List followed authors
#[utoipa::path(
    get,
    path = "/subscriptions",
    params(
        ("page" = inline(Option<i64>), Query, description = "1-based page number"),
        ("limit" = inline(Option<i64>), Query, description = "Page size"),
        ("recipes_limit" = inline(Option<i64>), Query, description = "Max recipes per author")
    ),
    responses(
        (status = 200, description = "Followed authors", body = Page<Author>)
    ),
    security(("token" = []))
)]
#[get("/subscriptions?<page>&<limit>&<recipes_limit>")]
pub async fn list_subscriptions(
    current: CurrentUser,
    mut db: Connection<Db>,
    config: &State<Config>,
    page: Option<i64>,
    limit: Option<i64>,
    recipes_limit: Option<i64>,
) -> Result<Json<Page<Author>>, Error> {
    let pagination = Pagination::new(page, limit, config.page_size)?;
    let recipes_limit = check_recipes_limit(recipes_limit)?;
    let (rows, count) = subscription::list_subscriptions(
        &mut db,
        current.id,
        pagination.offset(),
        pagination.limit,
    )
    .await?;
    let results = db::get_author_details(&mut db, rows, Some(current.id), recipes_limit).await?;
    Ok(Json(pagination.wrap(count, results)))
}

/// Follow an author
#[utoipa::path(
    post,
    path = "/{id}/subscribe",
    params(
        ("id" = i32, Path, description = "Author id"),
        ("recipes_limit" = inline(Option<i64>), Query, description = "Max recipes in the preview")
    ),
    responses(
        (status = 201, description = "Subscribed", body = Author),
        (status = 400, description = "Already subscribed or self subscription"),
        (status = 404, description = "Author not found")
    ),
    security(("token" = []))
)]
#[post("/<id>/subscribe?<recipes_limit>")]
pub async fn subscribe(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
    recipes_limit: Option<i64>,
) -> Result<(Status, Json<Author>), Error> {
    let recipes_limit = check_recipes_limit(recipes_limit)?;
    let author = find_user(&mut db, id).await?;
    subscription::subscribe(&mut db, current.id, author.id).await?;

    let rv = db::get_author_details(&mut db, vec![author], Some(current.id), recipes_limit)
        .await?
        .remove(0);
    Ok((Status::Created, Json(rv)))
}

/// Unfollow an author
#[utoipa::path(
    delete,
    path = "/{id}/subscribe",
    params(
        ("id" = i32, Path, description = "Author id")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed"),
        (status = 404, description = "Author not found")
    ),
    security(("token" = []))
)]
#[delete("/<id>/subscribe")]
pub async fn unsubscribe(
    current: CurrentUser,
    mut db: Connection<Db>,
    id: i32,
) -> Result<Status, Error> {
    let author = find_user(&mut db, id).await?;
    subscription::unsubscribe(&mut db, current.id, author.id).await?;
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        create_user,
        list_users,
        me,
        get_user,
        set_password,
        list_subscriptions,
        subscribe,
        unsubscribe
    ]
}

pub(crate) mod misc {
    use super::*;

    use utoipa::OpenApi;

    use crate::misc::TokenAuth;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Users API", description = "Users, profiles and subscriptions", version = "1.0"),
        servers((url = "/api/users")),
        paths(
            super::create_user,
            super::list_users,
            super::me,
            super::get_user,
            super::set_password,
            super::list_subscriptions,
            super::subscribe,
            super::unsubscribe
        ),
        components(schemas(CreateUser, SetPassword, User, Author, ValidationErrors)),
        modifiers(&TokenAuth)
    )]
    pub struct ApiDoc;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::test::{auth, rand_signup, signup, test_client};

    use foodgram_types::Login;

    #[test]
    fn negative_recipes_limit() {
        assert!(check_recipes_limit(Some(-1)).is_err());
        assert_eq!(check_recipes_limit(Some(0)).unwrap(), Some(0));
        assert_eq!(check_recipes_limit(None).unwrap(), None);
    }

    #[test]
    fn register_and_fetch_profile() {
        let client = test_client();
        let (user, token) = signup(&client);

        let response = client
            .get(uri!("/api/users", super::me))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let me: User = response.into_json().unwrap();
        assert_eq!(me, user);

        let response = client.get(uri!("/api/users", super::get_user(user.id))).dispatch();
        assert_eq!(response.status(), Status::Ok);

        let response = client.get(uri!("/api/users", super::get_user(-1))).dispatch();
        assert_eq!(response.status(), Status::NotFound);

        let response = client.get(uri!("/api/users", super::me)).dispatch();
        assert_eq!(response.status(), Status::Unauthorized);

        // public, yet a stale token is refused rather than read as anonymous
        let response = client
            .get(uri!("/api/users", super::get_user(user.id)))
            .header(auth("revoked-or-made-up"))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn invalid_registration() {
        let client = test_client();
        let mut payload = rand_signup();
        payload.email = "not-an-email".to_string();
        payload.password = String::new();
        let response = client
            .post(uri!("/api/users", super::create_user))
            .json(&payload)
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
        let errors: ValidationErrors = response.into_json().unwrap();
        assert!(errors.contains("email"));
        assert!(errors.contains("password"));
    }

    #[test]
    fn list_users_is_paginated() {
        let client = test_client();
        signup(&client);
        signup(&client);

        let response = client
            .get(uri!("/api/users", super::list_users(page = Some(1), limit = Some(1))))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let page: Page<User> = response.into_json().unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.count >= 2);
        assert_eq!(page.next, Some(2));

        let response = client
            .get(uri!("/api/users", super::list_users(page = Some(0), limit = _)))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[test]
    fn change_password() {
        let client = test_client();
        let payload = rand_signup();
        let response = client
            .post(uri!("/api/users", super::create_user))
            .json(&payload)
            .dispatch();
        assert_eq!(response.status(), Status::Created);
        let response = client
            .post("/api/auth/token/login")
            .json(&Login {
                email: payload.email.clone(),
                password: payload.password.clone(),
            })
            .dispatch();
        let token: foodgram_types::AuthToken = response.into_json().unwrap();

        let response = client
            .post(uri!("/api/users", super::set_password))
            .header(auth(&token.auth_token))
            .json(&SetPassword {
                new_password: "n3w-password".to_string(),
                current_password: "wrong".to_string(),
            })
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post(uri!("/api/users", super::set_password))
            .header(auth(&token.auth_token))
            .json(&SetPassword {
                new_password: "n3w-password".to_string(),
                current_password: payload.password.clone(),
            })
            .dispatch();
        assert_eq!(response.status(), Status::NoContent);

        let response = client
            .post("/api/auth/token/login")
            .json(&Login {
                email: payload.email,
                password: "n3w-password".to_string(),
            })
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
    }

    #[test]
    fn subscribe_lifecycle() {
        let client = test_client();
        let (reader, token) = signup(&client);
        let (author, _) = signup(&client);

        let response = client
            .post(uri!("/api/users", super::subscribe(id = reader.id, recipes_limit = _)))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post(uri!("/api/users", super::subscribe(id = -1, recipes_limit = _)))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::NotFound);

        let response = client
            .post(uri!("/api/users", super::subscribe(id = author.id, recipes_limit = Some(2))))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Created);
        let followed: Author = response.into_json().unwrap();
        assert!(followed.is_subscribed);
        assert_eq!(followed.recipes_count, 0);

        let response = client
            .post(uri!("/api/users", super::subscribe(id = author.id, recipes_limit = _)))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .get(uri!(
                "/api/users",
                super::list_subscriptions(page = _, limit = _, recipes_limit = _)
            ))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let page: Page<Author> = response.into_json().unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id, author.id);

        let response = client
            .get(uri!("/api/users", super::get_user(author.id)))
            .header(auth(&token))
            .dispatch();
        let profile: User = response.into_json().unwrap();
        assert!(profile.is_subscribed);

        let response = client
            .delete(uri!("/api/users", super::unsubscribe(author.id)))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::NoContent);

        let response = client
            .delete(uri!("/api/users", super::unsubscribe(author.id)))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }
}

use foodgram_types::{AuthToken, Login};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use tracing::{info, warn};

use super::errors::Error;
use super::fairings::db::Db;
use super::guards::CurrentUser;
use crate::db::{token, user};
use crate::utils::password;

/// Obtain an auth token
#[utoipa::path(
    post,
    path = "/login",
    request_body = Login,
    responses(
        (status = 200, description = "Token issued", body = AuthToken),
        (status = 400, description = "Invalid credentials")
    )
)]
#[post("/login", format = "application/json", data = "<payload>")]
pub async fn login(mut db: Connection<Db>, payload: Json<Login>) -> Result<Json<AuthToken>, Error> {
    let payload = payload.into_inner();
    let invalid = || Error::BadRequest("Unable to log in with provided credentials".to_string());

    let Some(m) = user::User::get_by_email(&mut db, payload.email.trim()).await? else {
        warn!(email = %payload.email, "login with unknown email");
        return Err(invalid());
    };
    if !password::verify_password_blocking(payload.password, m.password_hash).await? {
        warn!(id = m.id, "login with wrong password");
        return Err(invalid());
    }

    let auth_token = token::create_token(&mut db, m.id).await?;
    info!(id = m.id, "token issued");
    Ok(Json(AuthToken { auth_token }))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Not authenticated or already revoked")
    ),
    security(("token" = []))
)]
#[post("/logout")]
pub async fn logout(current: CurrentUser, mut db: Connection<Db>) -> Result<Status, Error> {
    if !token::delete_token(&mut db, &current.token).await? {
        // revoked by a concurrent logout after the guard resolved it
        return Err(Error::InvalidToken("Invalid token".to_string()));
    }
    info!(id = current.id, "token revoked");
    Ok(Status::NoContent)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, logout]
}

pub(crate) mod misc {
    use super::*;

    use utoipa::OpenApi;

    use crate::misc::TokenAuth;

    #[derive(OpenApi)]
    #[openapi(
        info(title = "Auth API", description = "Token authentication", version = "1.0"),
        servers((url = "/api/auth/token")),
        paths(super::login, super::logout),
        components(schemas(Login, AuthToken)),
        modifiers(&TokenAuth)
    )]
    pub struct ApiDoc;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::test::{auth, rand_signup, signup, test_client};

    #[test]
    fn wrong_credentials() {
        let client = test_client();
        let payload = rand_signup();
        let response = client
            .post(uri!("/api/auth/token", super::login))
            .json(&Login {
                email: payload.email,
                password: payload.password,
            })
            .dispatch();
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[test]
    fn logout_revokes_token() {
        let client = test_client();
        let (_, token) = signup(&client);

        let response = client
            .get("/api/users/me")
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);

        let response = client
            .post(uri!("/api/auth/token", super::logout))
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::NoContent);

        let response = client
            .get("/api/users/me")
            .header(auth(&token))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn concurrent_logouts_revoke_once() {
        use crate::api::test::test_app;
        use crate::db::user::test::create_rand_user;
        use crate::db::{connection, token};
        use futures::future::join_all;
        use rocket::local::asynchronous;

        let mut conn = connection::establish().await.unwrap();
        let user = create_rand_user(&mut conn).await;
        let raw = token::create_token(&mut conn, user.id).await.unwrap();

        let client = asynchronous::Client::tracked(test_app())
            .await
            .expect("valid rocket instance");
        let responses = join_all((0..4).map(|_| {
            client
                .post(uri!("/api/auth/token", super::logout))
                .header(auth(&raw))
                .dispatch()
        }))
        .await;

        let statuses: Vec<Status> = responses.iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses.iter().filter(|s| **s == Status::NoContent).count(),
            1,
            "{:?}",
            statuses
        );
        assert!(statuses
            .iter()
            .all(|s| *s == Status::NoContent || *s == Status::Unauthorized));
    }
}

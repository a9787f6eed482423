use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::Connection;

use crate::api::errors::Error;
use crate::api::fairings::db::Db;
use crate::db::token;

/// The user behind the `Authorization: Token <token>` header.
///
/// Use [`Viewer`] on endpoints open to anonymous callers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub is_staff: bool,
    /// The raw token the request was authenticated with
    pub token: String,
}

impl CurrentUser {
    pub fn require_staff(&self) -> Result<(), Error> {
        if self.is_staff {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

fn parse_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme == "Token" && !token.is_empty()).then_some(token)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = Error;

    async fn from_request(request: &'r rocket::Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(header) = request.headers().get_one("Authorization") else {
            return Outcome::Error((
                Status::Unauthorized,
                Error::MissingToken("Authentication credentials were not provided".to_string()),
            ));
        };
        let Some(raw) = parse_token(header) else {
            return Outcome::Error((
                Status::Unauthorized,
                Error::InvalidToken("Invalid token header".to_string()),
            ));
        };

        let mut db = match request.guard::<Connection<Db>>().await {
            Outcome::Success(db) => db,
            Outcome::Error((status, _)) => {
                return Outcome::Error((
                    status,
                    Error::InternalServer("Database unavailable".to_string()),
                ))
            }
            Outcome::Forward(status) => return Outcome::Forward(status),
        };

        match token::find_user_by_token(&mut db, raw).await {
            Ok(Some(user)) => Outcome::Success(CurrentUser {
                id: user.id,
                is_staff: user.is_staff,
                token: raw.to_string(),
            }),
            Ok(None) => Outcome::Error((
                Status::Unauthorized,
                Error::InvalidToken("Invalid token".to_string()),
            )),
            Err(e) => {
                tracing::error!(?e, "failed to look up token");
                Outcome::Error((
                    Status::InternalServerError,
                    Error::InternalServer("Internal server error".to_string()),
                ))
            }
        }
    }
}

/// Caller of an endpoint open to anonymous access.
///
/// Only a missing `Authorization` header makes the caller anonymous. A header
/// that does not authenticate fails the request the way [`CurrentUser`] does,
/// including a `500` when the token lookup itself fails.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<CurrentUser>);

impl Viewer {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Viewer {
    type Error = Error;

    async fn from_request(request: &'r rocket::Request<'_>) -> Outcome<Self, Self::Error> {
        if request.headers().get_one("Authorization").is_none() {
            return Outcome::Success(Viewer(None));
        }
        CurrentUser::from_request(request)
            .await
            .map(|user| Viewer(Some(user)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use rocket::http::Header;
    use rocket::local::blocking;

    #[get("/private")]
    fn private(user: CurrentUser) -> String {
        user.id.to_string()
    }

    #[get("/public")]
    fn public(viewer: Viewer) -> &'static str {
        match viewer.id() {
            Some(_) => "user",
            None => "anonymous",
        }
    }

    fn test_client() -> blocking::Client {
        let app = rocket::build().mount("/", routes![private, public]);
        blocking::Client::tracked(app).expect("valid rocket instance")
    }

    #[test]
    fn parse_header() {
        assert_eq!(parse_token("Token abc123"), Some("abc123"));
        assert_eq!(parse_token("  Token   abc123 "), Some("abc123"));
        assert_eq!(parse_token("Bearer abc123"), None);
        assert_eq!(parse_token("Token "), None);
        assert_eq!(parse_token("abc123"), None);
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let client = test_client();
        let response = client.get(uri!(private)).dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        let client = test_client();
        let response = client
            .get(uri!(private))
            .header(Header::new("Authorization", "Bearer abc123"))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn anonymous_access_to_public_route() {
        let client = test_client();
        let response = client.get(uri!(public)).dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().unwrap(), "anonymous");
    }

    #[test]
    fn public_route_rejects_bad_header() {
        let client = test_client();
        let response = client
            .get(uri!(public))
            .header(Header::new("Authorization", "Bearer abc123"))
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[test]
    fn public_route_keeps_lookup_failure() {
        // no database attached, so the token lookup cannot run
        let client = test_client();
        let response = client
            .get(uri!(public))
            .header(Header::new("Authorization", "Token abc123"))
            .dispatch();
        assert_eq!(response.status(), Status::InternalServerError);

        let response = client
            .get(uri!(private))
            .header(Header::new("Authorization", "Token abc123"))
            .dispatch();
        assert_eq!(response.status(), Status::InternalServerError);
    }

    #[test]
    fn staff_check() {
        let user = CurrentUser {
            id: 1,
            is_staff: false,
            token: "t".to_string(),
        };
        assert!(matches!(user.require_staff(), Err(Error::Forbidden(_))));
        let staff = CurrentUser {
            is_staff: true,
            ..user
        };
        assert!(staff.require_staff().is_ok());
    }
}

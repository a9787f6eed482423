use foodgram_types::ValidationErrors;
use rocket::serde::json::Json;

use crate::utils::{DatabaseError, RelationError};

#[derive(Responder, Debug)]
pub enum Error {
    #[response(status = 400)]
    BadRequest(String),
    /// Field-level messages, `{"field": ["message"]}`
    #[response(status = 400)]
    Validation(Json<ValidationErrors>),
    #[response(status = 401)]
    MissingToken(String),
    #[response(status = 401)]
    InvalidToken(String),
    #[response(status = 403)]
    Forbidden(String),
    #[response(status = 404)]
    NotFound(String),
    #[response(status = 500)]
    InternalServer(String),
}

impl From<ValidationErrors> for Error {
    fn from(e: ValidationErrors) -> Self {
        Error::Validation(Json(e))
    }
}

impl From<DatabaseError> for Error {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::DuplicationError { table } => {
                Error::BadRequest(format!("Record already exists in {}", table))
            }
            DatabaseError::ViolationError() => {
                Error::BadRequest("Referenced record does not exist".to_string())
            }
            DatabaseError::CheckViolation { constraint } => {
                Error::BadRequest(format!("Constraint {} violated", constraint))
            }
            DatabaseError::NotFound => Error::NotFound("Record not found".to_string()),
            DatabaseError::Query(e) => {
                tracing::error!(?e, "unexpected database error");
                Error::InternalServer("Internal server error".to_string())
            }
        }
    }
}

impl From<RelationError> for Error {
    fn from(e: RelationError) -> Self {
        match e {
            RelationError::AlreadyExists(_)
            | RelationError::NotFound(_)
            | RelationError::SelfSubscription => Error::BadRequest(capitalize(&e.to_string())),
            RelationError::Database(e) => e.into(),
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        DatabaseError::from(e).into()
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(?e, "internal error");
        Error::InternalServer("Internal server error".to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

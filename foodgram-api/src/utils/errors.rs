use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("duplicate key value violates unique constraint of {table:?}")]
    DuplicationError { table: String },
    #[error("foreign key constraint violation")]
    ViolationError(),
    #[error("check constraint {constraint:?} violated")]
    CheckViolation { constraint: String },
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Query(DieselError),
}

impl From<DieselError> for DatabaseError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DatabaseError::DuplicationError {
                    table: info.table_name().unwrap_or("unknown").to_string(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                DatabaseError::ViolationError()
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                DatabaseError::CheckViolation {
                    constraint: info.constraint_name().unwrap_or("unknown").to_string(),
                }
            }
            DieselError::NotFound => DatabaseError::NotFound,
            e => DatabaseError::Query(e),
        }
    }
}

/// Failures of the favorite / cart / subscription toggles.
#[derive(Error, Debug)]
pub enum RelationError {
    #[error("{0} already exists")]
    AlreadyExists(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("cannot subscribe to yourself")]
    SelfSubscription,
    #[error(transparent)]
    Database(DatabaseError),
}

impl RelationError {
    /// Translates a failed insert, turning unique violations into `AlreadyExists`.
    pub fn from_insert(relation: &'static str, e: DieselError) -> Self {
        match DatabaseError::from(e) {
            DatabaseError::DuplicationError { .. } => RelationError::AlreadyExists(relation),
            DatabaseError::CheckViolation { .. } => RelationError::SelfSubscription,
            e => RelationError::Database(e),
        }
    }
}

impl From<DatabaseError> for RelationError {
    fn from(e: DatabaseError) -> Self {
        RelationError::Database(e)
    }
}

impl From<DieselError> for RelationError {
    fn from(e: DieselError) -> Self {
        RelationError::Database(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Info {
        table: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl diesel::result::DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "violation"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            self.table
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.constraint
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, table: &'static str) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(Info {
                table: Some(table),
                constraint: Some("subscriptions_no_self_follow"),
            }),
        )
    }

    #[test]
    fn unique_violation_keeps_table() {
        let e: DatabaseError = db_error(DatabaseErrorKind::UniqueViolation, "tags").into();
        assert!(matches!(e, DatabaseError::DuplicationError { ref table } if table == "tags"));
    }

    #[test]
    fn duplicate_insert_is_already_exists() {
        let e = RelationError::from_insert(
            "favorite",
            db_error(DatabaseErrorKind::UniqueViolation, "favorites"),
        );
        assert!(matches!(e, RelationError::AlreadyExists("favorite")));
        assert_eq!(e.to_string(), "favorite already exists");
    }

    #[test]
    fn check_violation_is_self_subscription() {
        let e = RelationError::from_insert(
            "subscription",
            db_error(DatabaseErrorKind::CheckViolation, "subscriptions"),
        );
        assert!(matches!(e, RelationError::SelfSubscription));
    }

    #[test]
    fn other_errors_pass_through() {
        let e = RelationError::from_insert(
            "favorite",
            db_error(DatabaseErrorKind::ForeignKeyViolation, "favorites"),
        );
        assert!(matches!(
            e,
            RelationError::Database(DatabaseError::ViolationError())
        ));
        let e: DatabaseError = DieselError::NotFound.into();
        assert!(matches!(e, DatabaseError::NotFound));
    }
}

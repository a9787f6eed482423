pub mod logging;
pub mod password;
pub mod rand;

mod errors;
pub use errors::{DatabaseError, RelationError};

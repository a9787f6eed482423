pub mod auth;
pub mod configs;
pub mod errors;
pub mod fairings;
pub mod guards;
pub mod ingredients;
pub mod pagination;
pub mod recipes;
pub mod tags;
pub mod users;

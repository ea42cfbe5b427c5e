pub mod api;
pub mod auth;
pub mod errors;
pub mod main;

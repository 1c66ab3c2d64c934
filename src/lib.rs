pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod state;
pub mod stats;
pub mod validate;

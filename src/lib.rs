// Library exports for postboard
// This allows integration tests and the binary to share modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

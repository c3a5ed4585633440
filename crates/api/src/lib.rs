//! HTTP surface for the service log: axum routes, JWT auth and the
//! Argon2 password adapter.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;

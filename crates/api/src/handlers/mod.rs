pub mod auth;
pub mod service_entries;

pub mod service_entry;
pub mod user;

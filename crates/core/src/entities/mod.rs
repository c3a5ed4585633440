//! Entities and their invariant guards.
//!
//! Guards are the last line of defence: they hold even when a caller skips
//! the request pipeline.

pub mod service_entry;
pub mod user;

pub use service_entry::{
    canonical_plate, ServiceDateInput, ServiceEntry, ServiceEntryFields, ServiceEntryRecord,
};
pub use user::{canonical_username, User, UserRecord};

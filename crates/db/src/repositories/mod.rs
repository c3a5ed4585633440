pub mod service_entry_repo;
pub mod user_repo;

pub use service_entry_repo::ServiceEntryRepo;
pub use user_repo::UserRepo;

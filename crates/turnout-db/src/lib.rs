pub mod attendee_repo;
pub mod event_repo;
pub mod notification_repo;
pub mod schema;
pub mod store;
pub mod util;

pub use crate::store::DbStore;

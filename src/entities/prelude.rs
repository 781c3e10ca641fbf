pub use super::items::Entity as Items;
pub use super::merchants::Entity as Merchants;
pub use super::sync_status::Entity as SyncStatus;
pub use super::users::Entity as Users;

/// HTTP handlers for entry endpoints
pub mod entries;

pub use entries::{create_entry, delete_entry, get_entry, health, list_entries_by_owner};

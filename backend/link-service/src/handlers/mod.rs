/// HTTP handlers for the link service
pub mod links;

pub use links::{create_links, get_links, health, rearrange_links};

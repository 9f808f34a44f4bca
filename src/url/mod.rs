//! URL handling module for Magnet-Trawl
//!
//! This module computes catalog page URLs for the different pagination modes
//! and turns item hrefs into absolute URLs and identifiers.

mod item;
mod page;

pub use item::{extension_from_url, item_id_from_url, resolve_item_href};
pub use page::{PageMode, PageRequest};

//! # Blog Store Module
//!
//! The merge engine between the crawler and the persisted JSON files.
//!
//! ## Key Components
//!
//! - `BlogStore`: in-memory ID-keyed map owned by one crawl run; `insert` is
//!   its only mutation and doubles as the duplicate gate
//! - `finalize`: regroups records by member, applies relay aliases and sorts
//!   each member's blogs by date
//! - `Storage`: reads and writes blog stores, the desired-member list and
//!   the history columns
//!
//! A run seeds a `BlogStore` from disk, lets the lanes insert into it, and
//! writes the finalized member list back only if the store grew.

mod alias;
mod blog_store;
mod error;
mod storage;

pub use alias::{AliasPolicy, finalize, sort_blogs};
pub use blog_store::BlogStore;
pub use error::StoreError;
pub use storage::{Storage, StorageConfig};

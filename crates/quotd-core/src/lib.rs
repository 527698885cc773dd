//! quotd-core - Core library for quotd
//!
//! This crate contains the quote models, the libsql-backed storage layer,
//! and the local/remote synchronization engine used by all quotd interfaces.

pub mod db;
pub mod defaults;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Quote, QuoteId};
pub use store::QuoteStore;
pub use sync::SyncEngine;

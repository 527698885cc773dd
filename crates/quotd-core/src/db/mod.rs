//! Database layer for quotd

mod connection;
mod meta_repository;
mod migrations;
mod quote_repository;

pub use connection::Database;
pub use meta_repository::{LibSqlMetaRepository, MetaRepository};
pub use quote_repository::{LibSqlQuoteRepository, QuoteRepository};

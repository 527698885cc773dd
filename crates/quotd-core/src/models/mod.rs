//! Data models for quotd

mod conflict;
mod quote;

pub use conflict::{ConflictRecord, ConflictSnapshot, ConflictSummary, Resolution};
pub use quote::{normalized_key, Quote, QuoteId};

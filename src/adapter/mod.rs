//! Outbound adapters: the REST settlement source and the SQLite stores.

pub mod rest;
pub mod store;

pub use rest::RestSettlementSource;

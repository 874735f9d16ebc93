//! Chorus Storage
//!
//! Persistence for completed analyses.
//!
//! Provides:
//! - An append-only SQLite table with one flattened row per analysis
//! - Newest-first reads, disagreement filtering, and verdict statistics

pub mod persistence;

pub use persistence::{SqliteStore, StoreConfig};

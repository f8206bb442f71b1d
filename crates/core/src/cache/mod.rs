//! SQLite-backed partitioned cache for upstream responses.
//!
//! This module provides a persistent cache using SQLite with async access
//! via tokio-rusqlite. It supports:
//!
//! - Named partitions versioned for bulk invalidation
//! - FIFO eviction by insertion order (no access tracking)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::Entry;
pub use partitions::Partitions;

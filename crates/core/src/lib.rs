//! Core types and shared functionality for the wayfare gateway.
//!
//! This crate provides:
//! - Partitioned response cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, Entry, Partitions};
pub use config::AppConfig;
pub use error::Error;

//! Network side of the wayfare gateway.
//!
//! This crate provides URL canonicalization, the `Network` trait the
//! strategies dispatch through, and the reqwest-backed implementation.

pub mod fetch;

pub use fetch::{ClientConfig, FetchResponse, HttpClient, Network};
pub use fetch::url::{UrlError, canonicalize, resolve};

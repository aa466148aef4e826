#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    dead_code,
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Async client for the Lenses management REST API.
//!
//! Layout: `client.rs` (session setup and endpoint wrappers), `error.rs`
//! (`ClientError` and response classification).

pub mod client;
pub mod error;

pub use client::{Authentication, CONNECT_CLUSTERS_KEY, HEADER_TOKEN, LensesClient};
pub use error::{ClientError, ClientResult};

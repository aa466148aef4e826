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

//! File-backed configuration contexts for the Lenses CLI.
//!
//! Layout: `model.rs` (context and file models), `crypto.rs` (password
//! encryption at rest), `manager.rs` (`ConfigManager`: load, select, remove,
//! save), `defaults.rs` (well-known names and locations).

pub mod crypto;
pub mod defaults;
pub mod error;
pub mod manager;
pub mod model;

pub use crypto::{decrypt_password, decrypt_string, encrypt_password, encrypt_string};
pub use defaults::{
    CONFIG_FILE_NAME, DEFAULT_CONTEXT, DEFAULT_TIMEOUT, default_config_path, local_config_path,
};
pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use model::{ClientConfiguration, ConfigFile, ContextOverrides, REDACTED};

//! Command handlers grouped by concern.

pub(crate) mod acl;
pub(crate) mod connectors;
pub(crate) mod contexts;
pub(crate) mod files;
pub(crate) mod login;
pub(crate) mod user;

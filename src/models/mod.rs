//! Data models for the GLPI helpdesk module.
//!
//! This module contains the inbound brok types, the host cache entries,
//! the typed parameter schemas of every remote procedure, and the shared
//! identifier/session types.

mod brok;
mod common;
mod host;
mod params;

pub use brok::*;
pub use common::*;
pub use host::*;
pub use params::*;

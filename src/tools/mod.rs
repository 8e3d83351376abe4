//! Tool input types for the helpdesk tool server.
//!
//! This module contains the input types of the tools that expose the
//! front-end facade and the brok intake.

mod inputs;

pub use inputs::*;

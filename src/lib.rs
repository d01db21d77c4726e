//! docshelf: a local registry of cloned documentation repositories.
//!
//! Resources live in one of two scopes. Global resources are shared across
//! projects; project resources are local to one project directory and shadow
//! global ones with the same name. See [`registry::ResourceRegistry`] for the
//! operations and [`mcp`] for the agent-facing tools.

pub mod config;
pub mod mcp;
pub mod models;
pub mod providers;
pub mod registry;
pub mod store;

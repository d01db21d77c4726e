//! Domain models for docshelf.
//!
//! # Core Concepts
//!
//! - [`ResourceRecord`]: A tracked documentation repository as persisted on disk.
//!   Records do not know their scope; the file they live in decides it.
//! - [`Resource`]: A record tagged with the [`Scope`] it was read from. This is what
//!   the merged view hands out.
//! - [`Registry`]: The persisted collection for one scope.
//!
//! ## Operation results
//!
//! - [`ResourceListing`] and [`ResourceInfo`]: read-only views annotated with
//!   on-disk presence.
//! - [`BatchReport`]: per-resource outcomes of `update` and `restore`.
//! - [`SearchReport`] and [`TreeListing`]: results of content operations.

mod registry;
mod report;
mod resource;

pub use registry::*;
pub use report::*;
pub use resource::*;

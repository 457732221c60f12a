//! sck-cu library interface
//!
//! The Curation Engine behind the `sck-cu` binary, exposed for integration
//! testing:
//! - [`rating`]: statistics, artifact and scene ratings, write-back
//! - [`selection`]: space-constrained selection and copy planning
//! - [`organizer`]: target paths, file moves and NFO sidecars
//! - [`services`]: the GraphQL catalog client, folder cleanup, reports

pub mod display;
pub mod organizer;
pub mod paths;
pub mod rating;
pub mod selection;
pub mod services;

pub use paths::PathMapper;

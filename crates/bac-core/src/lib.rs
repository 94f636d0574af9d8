//! Border-admission control data model.
//!
//! This crate provides:
//! - [`steering`] - Steering data (permission bloom filters and permit-all/none markers)
//! - [`joiner_id`] - Joiner interface identifiers
//! - [`status`] - Aggregate admitter state and the closed reject-status set
//! - [`messages`] - Enroller and leader request/response/notification types
//! - [`link`] - Error taxonomy for the leader-request layer

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod joiner_id;
pub mod link;
pub mod messages;
pub mod status;
pub mod steering;

pub use joiner_id::*;
pub use link::*;
pub use messages::*;
pub use status::*;
pub use steering::*;

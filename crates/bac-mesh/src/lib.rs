//! Border-admission control subsystem.
//!
//! Decides which border device on a mesh is the prime admitter, holds
//! the mesh's single commissioner role on its behalf, and brokers
//! between external enrollers and the native admission protocol.
//!
//! The subsystem is single-threaded and sans-IO: every entry point
//! takes `now_ms` from the embedding uptime tracker, performs its state
//! transitions synchronously, and queues outbound actions as
//! [`Effect`] values for the run loop to drain. Nothing in this crate
//! blocks, sleeps, or reads a clock.
//!
//! Modules:
//! - [`timer`] - Deadline timers driven by the embedding run loop
//! - [`effect`] - Outbound command set and leader-exchange transaction ids
//! - [`enroller`] - Enroller/joiner registry owned by session slots
//! - [`arbitrator`] - Prime-admitter election state machine
//! - [`petitioner`] - Commissioner lease state machine
//! - [`admitter`] - Orchestrator and enroller protocol handlers

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod admitter;
pub mod arbitrator;
pub mod effect;
pub mod enroller;
pub mod petitioner;
pub mod timer;

pub use admitter::*;
pub use arbitrator::*;
pub use effect::*;
pub use enroller::*;
pub use petitioner::*;
pub use timer::*;

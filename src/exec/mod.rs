// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `Builder` and `Supervisor` traits the rest of
//!   the crate depends on, so tests can replace them with fakes.
//! - [`builder`] runs `cargo build` and keeps the last diagnostic output.
//! - [`supervisor`] owns the running child in a dedicated Tokio task and
//!   serializes start/stop requests.

pub mod backend;
pub mod builder;
pub mod supervisor;

pub use backend::{Builder, Supervisor};
pub use builder::CargoBuilder;
pub use supervisor::{spawn_supervisor, ChildSpec, SupervisorHandle};

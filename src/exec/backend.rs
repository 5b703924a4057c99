// src/exec/backend.rs

//! Pluggable build / process backends.
//!
//! The coordinator, the shutdown guard and the proxy talk to these traits
//! instead of concrete types, so tests can swap in fakes that record calls
//! without spawning cargo or a server.
//!
//! - [`CargoBuilder`](super::CargoBuilder) is the production `Builder`.
//! - [`SupervisorHandle`](super::SupervisorHandle) is the production
//!   `Supervisor`; it forwards requests to the actor that owns the child.

use crate::errors::Result;
use crate::types::BoxFuture;

/// Produces the executable.
pub trait Builder: Send + Sync {
    /// Name of the binary being built.
    fn binary(&self) -> &str;

    /// Raw diagnostic output of the most recent build (empty after a
    /// successful one).
    fn errors(&self) -> String;

    /// Run one build to completion.
    fn build(&self) -> BoxFuture<'_, Result<()>>;
}

/// Starts and stops the supervised executable.
///
/// Implementations must serialize requests: callers on different tasks
/// (coordinator, shutdown guard, proxy) never touch the child directly.
pub trait Supervisor: Send + Sync {
    /// Ensure an up-to-date instance is running.
    fn start(&self) -> BoxFuture<'_, Result<()>>;

    /// Stop the running instance, if any.
    fn stop(&self) -> BoxFuture<'_, Result<()>>;
}
